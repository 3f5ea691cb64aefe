// Gemini generateContent client: symbol lookup, signal analysis, live price, research.
use crate::advisor::MarketAdvisor;
use crate::advisor::prompt::{
    analysis_prompt, lookup_prompt, news_prompt, parse_analysis, parse_lookup, parse_news,
    parse_price_text, parse_profile, parse_strategy, price_prompt, profile_prompt, strategy_prompt,
};
use crate::model::{
    AdvisorError, AnalysisResult, CompanyProfile, InvestmentStrategy, NewsItem, OhlcBar, QuoteError,
    StockSymbol, TechnicalIndicators,
};
use crate::quote::PriceSource;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

/// How the model should shape its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseMode {
    /// `responseMimeType: application/json`.
    Json,
    /// Free text with Google Search grounding, for fresh prices and research.
    Grounded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Web sources the search grounding cited for the first candidate.
    fn source_urls(&self) -> Vec<String> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref()?.uri.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    language: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            language: language.into(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<&str, AdvisorError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_KEY => Ok(key),
            _ => Err(AdvisorError::MissingApiKey),
        }
    }

    fn build_request(prompt: &str, mode: ResponseMode) -> GenerateRequest {
        let contents = vec![Content {
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }];

        match mode {
            ResponseMode::Json => GenerateRequest {
                contents,
                tools: None,
                generation_config: Some(json!({ "responseMimeType": "application/json" })),
            },
            ResponseMode::Grounded => GenerateRequest {
                contents,
                tools: Some(vec![json!({ "google_search": {} })]),
                generation_config: None,
            },
        }
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> Result<String, AdvisorError> {
        self.send(prompt, mode).await?.text().ok_or(AdvisorError::EmptyResponse)
    }

    async fn send(&self, prompt: &str, mode: ResponseMode) -> Result<GenerateResponse, AdvisorError> {
        let key = self.api_key()?;
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let body = Self::build_request(prompt, mode);

        debug!("Calling {} ({:?})", self.model, mode);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("❌ Gemini API responded [{}]: {}", status, body);
            return Err(AdvisorError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MarketAdvisor for GeminiClient {
    async fn lookup_symbol(&self, query: &str) -> Result<Option<StockSymbol>, AdvisorError> {
        let text = self
            .generate(&lookup_prompt(query, &self.language), ResponseMode::Json)
            .await?;
        let found = parse_lookup(&text)?;
        info!("Symbol lookup '{}' -> {:?}", query, found.as_ref().map(|s| &s.symbol));
        Ok(found)
    }

    async fn analyze(
        &self,
        symbol: &str,
        series: &[OhlcBar],
        indicators: &TechnicalIndicators,
    ) -> Result<AnalysisResult, AdvisorError> {
        let prompt = analysis_prompt(symbol, series, indicators, &self.language)?;
        let text = self.generate(&prompt, ResponseMode::Json).await?;
        Ok(parse_analysis(&text)?)
    }

    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>, AdvisorError> {
        let response = self
            .send(&news_prompt(symbol, &self.language), ResponseMode::Grounded)
            .await?;
        let text = response.text().ok_or(AdvisorError::EmptyResponse)?;
        let items = parse_news(&text, &response.source_urls())?;
        if items.is_empty() {
            warn!("[{}] no JSON array in news reply", symbol);
        }
        Ok(items)
    }

    async fn company_profile(&self, symbol: &str) -> Result<Option<CompanyProfile>, AdvisorError> {
        let text = self
            .generate(&profile_prompt(symbol, &self.language), ResponseMode::Grounded)
            .await?;
        Ok(parse_profile(&text)?)
    }

    async fn strategy(
        &self,
        symbol: &str,
        current_price: f64,
        series: &[OhlcBar],
    ) -> Result<Option<InvestmentStrategy>, AdvisorError> {
        let prompt = strategy_prompt(symbol, current_price, series, &self.language)?;
        let text = self.generate(&prompt, ResponseMode::Grounded).await?;
        Ok(parse_strategy(&text)?)
    }
}

#[async_trait::async_trait]
impl PriceSource for GeminiClient {
    async fn fetch_price(&self, symbol: &str) -> Result<f64, QuoteError> {
        let text = self
            .generate(&price_prompt(symbol), ResponseMode::Grounded)
            .await?;
        parse_price_text(&text)
    }
}
