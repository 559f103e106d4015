//! Demo headlines served when no live article survives a fetch cycle.

use chrono::{DateTime, Duration, Utc};

use super::types::NewsArticle;

/// (title, text, source, author, sentiment, symbols), newest first.
const STATIC_ARTICLES: [(&str, &str, &str, &str, &str, &str); 8] = [
    (
        "AI Revolution Drives Tech Stocks to New Heights",
        "Major technology companies are experiencing unprecedented growth as artificial intelligence adoption accelerates across industries. Companies like NVIDIA, Microsoft, and Google are leading the charge with innovative AI solutions that are transforming business operations worldwide.",
        "Financial Times",
        "Tech Reporter",
        "positive",
        "NVDA,MSFT,GOOGL",
    ),
    (
        "Federal Reserve Signals Potential Rate Changes",
        "The Federal Reserve hints at monetary policy adjustments in response to evolving economic conditions. Market analysts are closely watching for signals about future interest rate decisions.",
        "Reuters",
        "Economic Analyst",
        "neutral",
        "SPY,QQQ,TLT",
    ),
    (
        "Cryptocurrency Market Shows Strong Recovery",
        "Digital assets rebound as institutional adoption continues to grow worldwide. Bitcoin and Ethereum lead the recovery with significant gains over the past week.",
        "CoinDesk",
        "Crypto Reporter",
        "positive",
        "BTC,ETH",
    ),
    (
        "Energy Sector Faces New Regulatory Challenges",
        "New environmental regulations are reshaping the energy landscape and investment strategies. Traditional energy companies are adapting to stricter compliance requirements.",
        "Energy Weekly",
        "Industry Expert",
        "negative",
        "XOM,CVX,COP",
    ),
    (
        "Electric Vehicle Sales Surge Globally",
        "Electric vehicle manufacturers report record sales as consumer adoption accelerates. Tesla, Ford, and GM are expanding production to meet growing demand.",
        "Auto News",
        "Auto Industry Analyst",
        "positive",
        "TSLA,F,GM",
    ),
    (
        "Healthcare Innovation Drives Biotech Gains",
        "Breakthrough medical technologies and drug developments are boosting biotech stocks. Several companies announce promising clinical trial results.",
        "BioWorld",
        "Medical Reporter",
        "positive",
        "JNJ,PFE,MRNA",
    ),
    (
        "Supply Chain Disruptions Impact Manufacturing",
        "Global supply chain challenges continue to affect manufacturing companies. Industry leaders are implementing new strategies to mitigate risks.",
        "Manufacturing Today",
        "Supply Chain Expert",
        "negative",
        "CAT,GE,HON",
    ),
    (
        "Renewable Energy Investment Reaches Record High",
        "Investment in renewable energy projects hits new records as governments and corporations commit to sustainability goals. Solar and wind projects lead the growth.",
        "Green Energy Report",
        "Sustainability Analyst",
        "positive",
        "ENPH,SEDG,NEE",
    ),
];

/// All static articles, spaced one hour apart back from `now`.
pub fn articles(now: DateTime<Utc>) -> Vec<NewsArticle> {
    STATIC_ARTICLES
        .iter()
        .enumerate()
        .map(|(i, (title, text, source, author, sentiment, symbols))| NewsArticle {
            date: now - Duration::hours(i as i64),
            title: title.to_string(),
            text: Some(text.to_string()),
            url: Some("#".to_string()),
            source: Some(source.to_string()),
            author: Some(author.to_string()),
            summary: None,
            sentiment: Some(sentiment.to_string()),
            symbols: Some(symbols.to_string()),
            tags: None,
            images: Vec::new(),
        })
        .collect()
}

/// Static articles that carry tickers.
pub fn market(now: DateTime<Utc>) -> Vec<NewsArticle> {
    articles(now)
        .into_iter()
        .filter(|a| a.symbols.is_some())
        .collect()
}

/// Articles tagged with `symbol`, or the first three when none are.
pub fn company(symbol: &str, now: DateTime<Utc>) -> Vec<NewsArticle> {
    let all = articles(now);
    let tagged: Vec<_> = all.iter().filter(|a| a.mentions(symbol)).cloned().collect();
    if tagged.is_empty() {
        all.into_iter().take(3).collect()
    } else {
        tagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_set_is_newest_first() {
        let now = Utc::now();
        let all = articles(now);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].date, now);
        assert!(all.windows(2).all(|w| w[0].date > w[1].date));
        assert_eq!(market(now).len(), 8);
    }

    #[test]
    fn company_fallback_matches_ticker_or_takes_first_three() {
        let now = Utc::now();
        let tsla = company("tsla", now);
        assert_eq!(tsla.len(), 1);
        assert_eq!(tsla[0].title, "Electric Vehicle Sales Surge Globally");

        let aapl = company("AAPL", now);
        assert_eq!(aapl.len(), 3);
        assert_eq!(aapl[0].title, "AI Revolution Drives Tech Stocks to New Heights");

        // "E" would substring-match several lists; only exact tickers count.
        assert_eq!(company("E", now).len(), 3);
    }
}
