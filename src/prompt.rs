//! # prompt — สร้าง Prompt สำหรับ Gemini
//!
//! The template asks for a grounded, sectioned market recap for one date.
//! Only the date is substituted; everything else is fixed wording.

use chrono::{DateTime, TimeZone};

/// Placeholder replaced by the formatted target date.
const DATE_PLACEHOLDER: &str = "{calculated_date}";

pub const PROMPT_TEMPLATE: &str = r#"あなたは経験豊富な金融アナリストです。
日付：{calculated_date}
Groundingツールを使用して最新の信頼できる情報にアクセスし、上記日付時点の金融市場の動向を日本語で簡潔にまとめてください。
推測や未確認の情報は含めず、数値は取得できたものだけを記載してください。

以下の形式で出力してください（Discordに投稿するため、全体で1800文字以内）。

📰 主要ニュースヘッドライン:
- 市場に影響を与えた主要ニュースを3〜5件、各1行で

📊 株価指数:
- S&P 500、ダウ平均、ナスダック総合、日経平均、TOPIXの終値と前日比（%）

💱 為替・金利:
- ドル円、ユーロ円、米10年債利回り

🛢️ コモディティ:
- WTI原油、金

🔍 今日の注目ポイント:
- 今後の市場で注目すべきイベントや指標を2〜3件
"#;

/// Formats the target date the way every message of the digest shows it.
pub fn format_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y年%m月%d日").to_string()
}

/// สร้าง Prompt โดยแทนที่วันที่ใน template
pub fn build_prompt(date: &str) -> String {
    PROMPT_TEMPLATE.replace(DATE_PLACEHOLDER, date)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    #[test]
    fn test_prompt_embeds_date_and_instructions() {
        let date = "2023年10月26日";
        let prompt = build_prompt(date);

        assert!(prompt.contains(&format!("日付：{date}")));
        assert!(prompt.contains("Groundingツールを使用して最新の信頼できる情報にアクセスし"));
        assert!(prompt.contains("主要ニュースヘッドライン:"));
        assert!(!prompt.contains(DATE_PLACEHOLDER));
    }

    #[test]
    fn test_format_date_uses_run_date() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = jst.with_ymd_and_hms(2024, 3, 5, 7, 30, 0).unwrap();
        assert_eq!(format_date(&now), "2024年03月05日");
    }
}
