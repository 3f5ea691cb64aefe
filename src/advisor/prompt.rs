// Prompt construction and reply parsing for the generative-AI advisor.
use crate::model::{
    AnalysisResult, CompanyProfile, InvestmentStrategy, NewsItem, OhlcBar, QuoteError, StockSymbol,
    TechnicalIndicators,
};
use crate::utils::normalize_symbol;

/// Number of trailing bars included in the analysis prompt.
pub const RECENT_BARS: usize = 5;
/// Trailing bars handed to the strategy prompt.
pub const STRATEGY_BARS: usize = 20;
pub const NEWS_COUNT: usize = 6;

pub fn lookup_prompt(query: &str, language: &str) -> String {
    format!(
        "Identify the major stock market symbol for the query: \"{query}\".\n\
         Prefer US listings if available, otherwise major global listings.\n\
         Return a STRICT JSON object (no markdown) with:\n\
         - symbol (e.g. \"AAPL\" or \"TSM\")\n\
         - name (company name, keep it short)\n\
         - sector (general sector, e.g. \"Technology\", written in {language})\n\
         If the query is invalid or not a public company, return null."
    )
}

pub fn price_prompt(symbol: &str) -> String {
    format!(
        "Find the current stock price of {symbol}. Return ONLY the number (e.g. 142.50). \
         Do not include currency symbols or text."
    )
}

pub fn analysis_prompt(
    symbol: &str,
    series: &[OhlcBar],
    indicators: &TechnicalIndicators,
    language: &str,
) -> Result<String, serde_json::Error> {
    let recent = &series[series.len().saturating_sub(RECENT_BARS)..];
    let recent_json = serde_json::to_string_pretty(recent)?;

    Ok(format!(
        "You are an expert technical analyst. Analyze the following stock data for {symbol}.\n\n\
         Current Indicators:\n\
         - RSI (14): {rsi:.2}\n\
         - MACD Line: {macd:.4}\n\
         - Signal Line: {signal:.4}\n\
         - MACD Histogram: {hist:.4}\n\n\
         Recent Price Action (last {count} days):\n{recent_json}\n\n\
         Determine a trading signal (BUY, SELL, or HOLD) based on standard technical analysis rules.\n\
         Provide a concise reasoning and a confidence score (0-100).\n\
         IMPORTANT: The \"reasoning\" MUST be written in {language}.",
        rsi = indicators.rsi,
        macd = indicators.macd.macd_line,
        signal = indicators.macd.signal_line,
        hist = indicators.macd.histogram,
        count = recent.len(),
    ))
}

pub fn news_prompt(symbol: &str, language: &str) -> String {
    format!(
        "Find {NEWS_COUNT} latest news articles for {symbol} stock.\n\
         Format the output as a valid JSON array of objects.\n\
         Each object should have keys: \"title\", \"summary\", \"source\", \"time\" (e.g. '2 hours ago').\n\
         IMPORTANT: \"title\" and \"summary\" MUST be translated to {language}.\n\
         Do not include markdown code blocks. Just the JSON string."
    )
}

pub fn profile_prompt(symbol: &str, language: &str) -> String {
    format!(
        "Get company details for {symbol}.\n\
         Format the output as a valid JSON object with keys:\n\
         \"description\" (short bio), \"ceo\", \"founded\" (year), \"headquarters\", \"employees\", \
         \"marketCap\", \"peRatio\", \"dividendYield\", \"website\".\n\
         If data is unavailable, use \"N/A\".\n\
         IMPORTANT: \"description\" MUST be translated to {language}.\n\
         Do not include markdown code blocks. Just the JSON string."
    )
}

pub fn strategy_prompt(
    symbol: &str,
    current_price: f64,
    series: &[OhlcBar],
    language: &str,
) -> Result<String, serde_json::Error> {
    let recent = &series[series.len().saturating_sub(STRATEGY_BARS)..];
    let recent_json = serde_json::to_string(recent)?;

    Ok(format!(
        "Act as an AGGRESSIVE Hedge Fund Manager.\n\
         Analyze {symbol} for a High-Risk/High-Reward investment plan.\n\
         Current Price: {current_price:.2}.\n\
         Recent Data: {recent_json}.\n\n\
         Calculate a Risk/Reward Ratio (e.g. 1:3).\n\
         Estimate Win Rate % based on trend strength.\n\
         Identify 3 Price Scenarios: Bearish (Support break), Base (Realistic), Bullish (Moonshot).\n\
         Identify 3-4 Catalyst events (e.g. Earnings, Sector rotation, Macro).\n\n\
         Return a JSON object (no markdown) with this EXACT structure:\n\
         {{\n\
           \"action\": \"BUY\" | \"SELL\" | \"WAIT\",\n\
           \"actionTitle\": \"Aggressive Title ({language})\",\n\
           \"longTermTrend\": \"BULLISH\" | \"BEARISH\" | \"NEUTRAL\",\n\
           \"entryZone\": \"Price range (e.g. $140 - $145)\",\n\
           \"takeProfit\": \"Primary Target (e.g. $180)\",\n\
           \"stopLoss\": \"Stop Price (e.g. $120)\",\n\
           \"riskRewardRatio\": \"String (e.g. 1 : 3.5)\",\n\
           \"winRate\": Number (0-100),\n\
           \"catalysts\": [\"String 1\", \"String 2\", \"String 3\"],\n\
           \"scenarios\": {{ \"bearish\": \"$110\", \"base\": \"$175\", \"bullish\": \"$210\" }},\n\
           \"timeHorizon\": \"String (e.g. 3-6 months)\",\n\
           \"riskLevel\": \"String (e.g. Very high)\",\n\
           \"rationale\": \"Detailed analysis in {language} (approx 100 words)\"\n\
         }}"
    ))
}

/// Strips a surrounding Markdown code fence, if any.
pub fn clean_json_string(text: &str) -> &str {
    let mut clean = text.trim();
    if let Some(rest) = clean.strip_prefix("```json") {
        clean = rest;
    } else if let Some(rest) = clean.strip_prefix("```") {
        clean = rest;
    }
    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest;
    }
    clean.trim()
}

/// Keeps digits and dots only, then parses up to the second dot.
pub fn parse_price_text(text: &str) -> Result<f64, QuoteError> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = digits.splitn(3, '.');
    let whole = parts.next().unwrap_or_default();
    let candidate = match parts.next() {
        Some(fraction) => format!("{whole}.{fraction}"),
        None => whole.to_string(),
    };

    candidate
        .parse::<f64>()
        .map_err(|_| QuoteError::InvalidResponse(text.to_string()))
}

/// Outermost `[...]` span of a free-text reply.
pub fn extract_json_array(text: &str) -> Option<&str> {
    extract_between(text, '[', ']')
}

/// Outermost `{...}` span of a free-text reply.
pub fn extract_json_object(text: &str) -> Option<&str> {
    extract_between(text, '{', '}')
}

fn extract_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

/// Parses a grounded news reply. Source links are handed out round-robin
/// since the grounding metadata does not say which link backs which item.
pub fn parse_news(text: &str, source_urls: &[String]) -> Result<Vec<NewsItem>, serde_json::Error> {
    let Some(json) = extract_json_array(text) else {
        return Ok(Vec::new());
    };
    let mut items: Vec<NewsItem> = serde_json::from_str(json)?;
    if !source_urls.is_empty() {
        for (index, item) in items.iter_mut().enumerate() {
            item.url = Some(source_urls[index % source_urls.len()].clone());
        }
    }
    Ok(items)
}

pub fn parse_profile(text: &str) -> Result<Option<CompanyProfile>, serde_json::Error> {
    extract_json_object(text).map(serde_json::from_str).transpose()
}

pub fn parse_strategy(text: &str) -> Result<Option<InvestmentStrategy>, serde_json::Error> {
    let Some(json) = extract_json_object(text) else {
        return Ok(None);
    };
    let mut strategy: InvestmentStrategy = serde_json::from_str(json)?;
    strategy.win_rate = strategy.win_rate.clamp(0.0, 100.0);
    Ok(Some(strategy))
}

pub fn parse_lookup(text: &str) -> Result<Option<StockSymbol>, serde_json::Error> {
    let parsed: Option<StockSymbol> = serde_json::from_str(clean_json_string(text))?;
    Ok(parsed
        .map(|mut stock| {
            stock.symbol = normalize_symbol(&stock.symbol);
            stock
        })
        .filter(|stock| !stock.symbol.is_empty()))
}

pub fn parse_analysis(text: &str) -> Result<AnalysisResult, serde_json::Error> {
    let mut result: AnalysisResult = serde_json::from_str(clean_json_string(text))?;
    result.confidence = result.confidence.clamp(0.0, 100.0);
    Ok(result)
}
