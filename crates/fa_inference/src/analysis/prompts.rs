use fa_core::ChatPrompt;

use crate::Language;

const SENTIMENT_SYSTEM: &str = "You are a financial sentiment analyst. Output valid JSON only.";
const EXTRACTION_SYSTEM: &str = "You are a helpful financial assistant. Output only valid JSON.";
const ADVICE_SYSTEM: &str = "You are a professional investment advisor.";

pub fn sentiment(language: Language, text: &str) -> ChatPrompt {
    let user = match language {
        Language::TraditionalChinese => format!(
            "請分析以下財經新聞的情緒。\n\
             請只輸出 JSON 格式，包含兩個欄位：\n\
             - label: \"positive\", \"neutral\", 或 \"negative\"\n\
             - score: 0.0 到 1.0 之間的情緒強度分數\n\n\
             新聞內容：\n{}",
            text
        ),
        Language::English => format!(
            "Analyze the sentiment of the following financial news.\n\
             Output JSON only, with two fields:\n\
             - label: \"positive\", \"neutral\", or \"negative\"\n\
             - score: sentiment strength between 0.0 and 1.0\n\n\
             News content:\n{}",
            text
        ),
    };
    ChatPrompt::new(SENTIMENT_SYSTEM, user).with_temperature(0.0)
}

pub fn extraction(language: Language, text: &str) -> ChatPrompt {
    let user = match language {
        Language::TraditionalChinese => format!(
            "請分析以下財經新聞，並提取關鍵資訊。請務必使用**繁體中文**回答。請以 JSON 格式輸出，包含以下欄位：\n\
             - company_name: 公司名稱 (List of strings)\n\
             - stock_code: 股票代號 (List of strings)\n\
             - financial_data: 財務數據 (Dictionary, e.g., {{\"revenue\": \"...\", \"eps\": \"...\"}})\n\
             - events: 重大事件 (List of strings)\n\
             - time_info: 時間資訊 (String)\n\n\
             新聞內容：\n{}",
            text
        ),
        Language::English => format!(
            "Analyze the following financial news and extract the key information. Answer in **English**. \
             Output JSON with these fields:\n\
             - company_name: company names (List of strings)\n\
             - stock_code: ticker symbols (List of strings)\n\
             - financial_data: financial figures (Dictionary, e.g., {{\"revenue\": \"...\", \"eps\": \"...\"}})\n\
             - events: major events (List of strings)\n\
             - time_info: time reference (String)\n\n\
             News content:\n{}",
            text
        ),
    };
    ChatPrompt::new(EXTRACTION_SYSTEM, user).with_temperature(0.0)
}

/// `label` is already localized for `language`.
pub fn advice(language: Language, text: &str, label: &str) -> ChatPrompt {
    let user = match language {
        Language::TraditionalChinese => format!(
            "基於以下財經新聞內容以及情緒分析結果（{}），請給出結構化的投資建議。請務必使用**繁體中文**回答。\n\
             建議應包含：\n\
             1. 短期觀察重點\n\
             2. 長期投資潛力\n\
             3. 風險提示\n\n\
             新聞內容：\n{}",
            label, text
        ),
        Language::English => format!(
            "Based on the following financial news and its sentiment ({}), give structured investment advice. \
             Answer in **English**.\n\
             The advice should cover:\n\
             1. Short-term points to watch\n\
             2. Long-term investment potential\n\
             3. Risk warnings\n\n\
             News content:\n{}",
            label, text
        ),
    };
    ChatPrompt::new(ADVICE_SYSTEM, user)
}
