//! Kaizen AI prompt templates.

use super::Prompt;

/// Served with HTTP 200 when the market summary cannot be generated.
pub const SUMMARY_UNAVAILABLE: &str =
    "Market analysis temporarily unavailable. Our AI systems are processing the latest data.";

pub fn chat(query: &str) -> Prompt {
    Prompt {
        text: format!(
            "You are Kaizen AI, an expert financial market analyst with deep knowledge of stocks, \
cryptocurrencies, market trends, and economic indicators.

User query: \"{}\"

Provide a concise, insightful analysis (2-3 sentences max) that includes:
- Relevant market data or trends
- Actionable insights
- Professional tone suitable for financial professionals

Keep responses brief but valuable, focusing on current market conditions and data-driven insights.",
            query.trim()
        ),
        max_tokens: 150,
        temperature: 0.7,
    }
}

pub fn market_summary() -> Prompt {
    Prompt {
        text: "As Kaizen AI, provide a brief market summary for today including:
- Overall market sentiment
- Key sector performances
- Notable stock movements
- Economic indicators to watch

Keep it concise and professional (3-4 sentences)."
            .to_string(),
        max_tokens: 200,
        temperature: 0.6,
    }
}

pub fn stock_analysis(symbol: &str) -> Prompt {
    Prompt {
        text: format!(
            "As Kaizen AI, analyze {} stock:
- Current performance and trends
- Key factors affecting the stock
- Short-term outlook
- Risk assessment

Provide a concise professional analysis (2-3 sentences).",
            symbol.trim().to_ascii_uppercase()
        ),
        max_tokens: 150,
        temperature: 0.7,
    }
}
