//! Role instructions sent to the oracle by each stage

use crate::state_machine::{
    CrossSiloEvaluation, EvaluationResult, ProblemProfile, ProfileField,
};

/// Opening message shown before the first turn
pub const GREETING: &str = "👋 你好！我是 **AI 策略顧問**，幫助你釐清專案目標。

📝 **請告訴我您的職位，並寫出日常會遭遇而且希望自己可以解決的問題。**

💭 不要受限於可不可能解決，請先跳脫這一點，寫下你想到的每一件事。

❓ **思考方向:**
- 哪些問題讓你非常煩惱、最想解決？
- 哪些問題不斷出現？
- 如果問題不斷重複出現，可能就是你選擇解決它的理由

現在，請告訴我你想解決的問題 👇";

/// Reply when the cross-department discussion clears the gate
pub const CROSS_SILO_COMPLETE: &str = "您的回答已完整";

fn show(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("（尚未提供）")
}

fn field_names(fields: &[ProfileField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn situation(profile: &ProblemProfile, job_title: Option<&str>) -> String {
    format!(
        "你是一個策略顧問，專門協助企業高層釐清他的職位與專案目標。
目前已知的資訊：
- 職位: {}
- 痛點: {}
- 目標: {}

請分析主管的最新回答，判斷是否需要更新 job_title、pain_point、goal。

規則：
1. 若主管提供了新資訊或修正舊資訊，請將「舊資訊」與「新資訊」整合成一段完整且通順的描述後回傳，不要只列出新增的部份。
2. 若主管的回答中未提及某項資訊或資訊未變更，請回傳 null。
3. 只有在主管明確更正先前提供的職位時，job_title_corrected 才設為 true。",
        show(job_title),
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn reflection(profile: &ProblemProfile, missing: &[ProfileField]) -> String {
    format!(
        "你是一個策略顧問，專門協助企業高層釐清專案目標。
目前已知資訊如下：
- 痛點: {}
- 目標: {}
- 缺失資訊: {}
你的任務是設計一個針對性的問題，引導主管補充缺失資訊。
注意：
- 不要打招呼也不要給標題，直接問問題",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
        field_names(missing),
    )
}

pub fn summary(profile: &ProblemProfile) -> String {
    format!(
        "你是一位策略顧問，請針對痛點與目標的問答文本，分別針對痛點和目標做摘要，每個資訊都用逗點隔開，不可以漏掉任何資訊。
痛點: {}
目標: {}

注意：
- 只需回覆精簡摘要，無需多餘的說明或打招呼
- job_title 請回傳 null",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn evaluation(profile: &ProblemProfile) -> String {
    format!(
        "# Role
你是一位專精於「破框思維 (Break-the-Box Thinking)」的台灣策略顧問。你的任務是用親切且中肯的語氣評估用戶提出的「問題陳述」是否具備戰略解決的價值。

# Task
請根據以下三個維度進行嚴格評分 (0-100)，並給出中肯的評語。
痛點：{}
目標：{}

# Evaluation Criteria (Rubric)

1. **Pain Point (30分)**
- 0-10分: 只說了感覺 (例如「很累」、「很難」)。
- 11-20分: 提到了大致狀況，但缺乏情境。
- 21-30分: 清楚描述了「誰」在「什麼情境」下遇到了「什麼具體阻礙」。

2. **Goal & Metric (40分)**
- 0-10分: 完全沒提到目標或數字。
- 11-25分: 有目標但無量化指標 (例如「想提升效率」)。
- 26-40分: 有明確的成功定義與量化指標 (例如「提升 20% 轉換率」)。

3. **Solution Bias (Box Trap) (30分)**
- 0分 (陷入框框): 用戶直接把「解決方案」當成問題 (例如「我需要導入 AI」)。這是手段，不是問題。
- 30分 (破框): 用戶專注於想解決的本質困難或想創造的價值，而非限定某種工具。",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn refine_ask(result: &EvaluationResult) -> String {
    format!(
        "剛才的評估結果顯示高層定義問題可以更好。
評語：{}
建議方向：{}
缺失資訊：{}

請根據上述建議，扮演親切但專業的顧問，用200字以內的問題引導高層深入挖掘議題以補足缺失資訊。
注意：
- 不要打招呼也不要給標題，直接問問題
- 問題要精簡，且附上一個舉例幫助理解",
        result.critique,
        result.advice,
        result.missing_fields.join(", "),
    )
}

pub fn hmw(profile: &ProblemProfile) -> String {
    format!(
        "你是一位策略顧問，請將以下問題陳述改寫成指定的回覆格式，幫助用戶聚焦在解決方案的探索上。
痛點: {}
目標: {}
回覆格式範例: 總結您想解決的問題：在...的情境下，如何...？
注意：
- 無需多餘的說明或打招呼",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn cross_silo_ask(job_title: Option<&str>, profile: &ProblemProfile) -> String {
    let title = show(job_title);
    format!(
        "你是一位跨領域的策略顧問，專門協助高層從跨部門的角度審視問題所需要的資源。
詢問主管：「從{title}職位來看，解決這個問題有什麼影響力？您需要其他部門提供哪些資源或能力來協助解決？」
並從主管職位舉個例子，說明可能需要的資源，再詢問是否有要補充或資訊是否正確。
職位：{title}
要解決的問題：痛點 {}；目標 {}
注意：
- 只需回覆，無需多餘的說明或打招呼
- 例子要從高層的職位出發，並且具體說明部門可能需要的資源",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn cross_silo_evaluate(
    job_title: Option<&str>,
    profile: &ProblemProfile,
    discussion: &str,
) -> String {
    format!(
        "你是一位跨領域的策略顧問，專門協助高層從跨部門的角度審視問題所需要的資源。
根據先前的討論，替討論的完整性打一個分數 (0-100)。advice 欄位請寫下當前總結與建議，若仍不完整，請以一個問題引導主管深入思考。
職位：{}
要解決的問題：痛點 {}；目標 {}
先前討論：
{discussion}

注意：
- 只需回覆，無需多餘的說明或打招呼
- 例子要從高層的職位出發，並且具體說明部門可能需要的資源",
        show(job_title),
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
    )
}

pub fn final_summary(profile: &ProblemProfile, cross_silo: &CrossSiloEvaluation) -> String {
    format!(
        "你是一位策略顧問，請根據以下資訊，產生一個完整且具體的策略報告，幫助用戶聚焦在核心議題上。
痛點: {}
目標: {}
跨部門視角: {}
注意：
- 策略要具體且具備可行性，無需多餘的說明或打招呼
- 報告最後詢問用戶是否需要將報告匯出成檔案",
        show(profile.pain_point.as_deref()),
        show(profile.goal.as_deref()),
        cross_silo.result,
    )
}

pub const FILE_EXPORT: &str = "你是一位貼心的助理。
請根據用戶的回覆決定下一步行動：
1. 若用戶同意匯出報告，請根據對話歷史中的『策略報告』內容，使用 generate_report 工具來生成檔案。
   - filename 請使用英文 (例如 strategy_report)
   - title 請使用報告的標題
   - sections 請將報告整理成數個段落，每段有標題與關鍵策略列點
2. 若用戶不需要或拒絕，請禮貌回應並結束對話。
3. 若檔案已經生成，請告知用戶檔案位置。";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_render_placeholder() {
        let profile = ProblemProfile {
            pain_point: Some("流失率太高".to_string()),
            goal: Some("  ".to_string()),
        };
        let prompt = summary(&profile);
        assert!(prompt.contains("痛點: 流失率太高"));
        assert!(prompt.contains("目標: （尚未提供）"));
    }

    #[test]
    fn test_reflection_lists_missing_fields() {
        let prompt = reflection(&ProblemProfile::default(), &ProfileField::ALL);
        assert!(prompt.contains("缺失資訊: pain_point, goal"));
    }
}
