//! Google Sheets catalog
//!
//! Reads the main-dish and side-dish sheets of one spreadsheet through the
//! Sheets values API. The parsed catalog is cached for a short while so a
//! busy conversation does not refetch it on every turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::row_parser::parse_rows;
use crate::adapters::google::GoogleAuth;
use crate::domain::catalog::{Dish, DishCategory, DishFilter};
use crate::ports::{apply_filter, CatalogError, CatalogSource};

/// Which spreadsheet to read and how.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub main_sheet: String,
    pub side_sheet: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://sheets.googleapis.com/v4".to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            main_sheet: "Dishes".to_string(),
            side_sheet: "Sides".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_sheets(mut self, main: impl Into<String>, side: impl Into<String>) -> Self {
        self.main_sheet = main.into();
        self.side_sheet = side.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

struct CachedCatalog {
    dishes: Vec<Dish>,
    fetched_at: Instant,
}

pub struct SheetsCatalog {
    config: SheetsConfig,
    auth: GoogleAuth,
    client: Client,
    cache: RwLock<Option<CachedCatalog>>,
}

impl SheetsCatalog {
    pub fn new(config: SheetsConfig, auth: GoogleAuth) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(config, auth, client))
    }

    pub fn with_client(config: SheetsConfig, auth: GoogleAuth, client: Client) -> Self {
        Self {
            config,
            auth,
            client,
            cache: RwLock::new(None),
        }
    }

    fn values_url(&self, sheet: &str) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| CatalogError::unavailable(format!("bad Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::unavailable("Sheets base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["spreadsheets", self.config.spreadsheet_id.as_str(), "values", sheet]);
        Ok(url)
    }

    /// Fetches one sheet. `Ok(None)` means the sheet does not exist.
    async fn fetch_sheet(&self, sheet: &str) -> Result<Option<Vec<Vec<String>>>, CatalogError> {
        let request = self.client.get(self.values_url(sheet)?);
        let request = self
            .auth
            .apply(request)
            .await
            .map_err(|e| CatalogError::unavailable(e.to_string()))?;
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout(self.config.timeout.as_secs())
            } else {
                CatalogError::unavailable(format!("Sheets request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            // Sheets answers 400 "Unable to parse range" for a missing tab.
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::unavailable(format!("Sheets returned {}", status)));
        }
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| CatalogError::invalid(format!("sheet '{}': {}", sheet, e)))?;
        Ok(Some(range.values.into_iter().map(stringify_row).collect()))
    }

    async fn load(&self) -> Result<Vec<Dish>, CatalogError> {
        let (mains, sides) = futures::try_join!(
            self.fetch_sheet(&self.config.main_sheet),
            self.fetch_sheet(&self.config.side_sheet)
        )?;

        let mains = mains.ok_or_else(|| {
            CatalogError::invalid(format!("sheet '{}' not found", self.config.main_sheet))
        })?;
        let mut dishes = self.parse_sheet(&self.config.main_sheet, &mains, DishCategory::Main)?;

        match sides {
            Some(rows) => {
                dishes.extend(self.parse_sheet(&self.config.side_sheet, &rows, DishCategory::Side)?)
            }
            None => tracing::warn!(sheet = %self.config.side_sheet, "Side dish sheet not found, no sides offered"),
        }
        Ok(dishes)
    }

    fn parse_sheet(
        &self,
        sheet: &str,
        rows: &[Vec<String>],
        category: DishCategory,
    ) -> Result<Vec<Dish>, CatalogError> {
        let (dishes, issues) =
            parse_rows(rows, category).map_err(|e| CatalogError::invalid(format!("sheet '{}': {}", sheet, e)))?;
        for issue in issues {
            tracing::warn!(sheet, row = issue.row, reason = %issue.reason, "Skipping catalog row");
        }
        Ok(dishes)
    }

    async fn cached(&self) -> Option<Vec<Dish>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.config.cache_ttl)
            .map(|c| c.dishes.clone())
    }
}

fn stringify_row(row: Vec<Value>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

#[async_trait]
impl CatalogSource for SheetsCatalog {
    async fn list_dishes(&self, filter: Option<&DishFilter>) -> Result<Vec<Dish>, CatalogError> {
        if let Some(dishes) = self.cached().await {
            return Ok(apply_filter(dishes, filter));
        }

        let dishes = self.load().await?;
        tracing::debug!(
            spreadsheet = %self.config.spreadsheet_id,
            dishes = dishes.len(),
            "Catalog loaded from Sheets"
        );
        *self.cache.write().await = Some(CachedCatalog {
            dishes: dishes.clone(),
            fetched_at: Instant::now(),
        });
        Ok(apply_filter(dishes, filter))
    }

    fn source_name(&self) -> &'static str {
        "sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers every request whose path contains a route's needle with that
    /// route's response; anything else gets a 400.
    async fn fake_sheets(routes: Vec<(&'static str, u16, String)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(needle, _, _)| path.contains(needle))
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((400, "{}".to_string()));
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.ok();
                socket.shutdown().await.ok();
            }
        });
        (format!("http://{}", addr), hits)
    }

    fn mains_body() -> String {
        serde_json::json!({
            "range": "Dishes!A1:D3",
            "values": [
                ["Name", "Persons", "Effort", "Ingredients"],
                ["Lasagne", "4", "elaborate", "500 g minced beef; 12 sheets pasta"],
                ["Carbonara", 2, "quick", "250 g spaghetti; 3 eggs"],
                ["Broken", "lots", "quick", ""]
            ]
        })
        .to_string()
    }

    fn sides_body() -> String {
        serde_json::json!({
            "values": [["Name", "Persons", "Effort"], ["Green salad", "4", "quick"]]
        })
        .to_string()
    }

    fn catalog(base_url: &str) -> SheetsCatalog {
        let config = SheetsConfig::new("sheet-1").with_base_url(base_url);
        SheetsCatalog::new(config, GoogleAuth::None).unwrap()
    }

    #[test]
    fn sheet_names_are_percent_encoded() {
        let catalog = SheetsCatalog::new(
            SheetsConfig::new("abc").with_base_url("https://sheets.example/v4"),
            GoogleAuth::None,
        )
        .unwrap();
        let url = catalog.values_url("Main dishes").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example/v4/spreadsheets/abc/values/Main%20dishes"
        );
    }

    #[tokio::test]
    async fn loads_mains_and_sides_skipping_bad_rows() {
        let (url, _) = fake_sheets(vec![
            ("/values/Dishes", 200, mains_body()),
            ("/values/Sides", 200, sides_body()),
        ])
        .await;
        let dishes = catalog(&url).list_dishes(None).await.unwrap();

        let names: Vec<_> = dishes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Lasagne", "Carbonara", "Green salad"]);
        assert_eq!(dishes[1].base_person_count, 2);
        assert_eq!(dishes[2].category, DishCategory::Side);
    }

    #[tokio::test]
    async fn filter_is_applied() {
        let (url, _) = fake_sheets(vec![
            ("/values/Dishes", 200, mains_body()),
            ("/values/Sides", 200, sides_body()),
        ])
        .await;
        let sides = catalog(&url).list_dishes(Some(&DishFilter::sides())).await.unwrap();
        assert_eq!(sides.len(), 1);
        assert_eq!(sides[0].name, "Green salad");
    }

    #[tokio::test]
    async fn missing_side_sheet_means_no_sides() {
        let (url, _) = fake_sheets(vec![("/values/Dishes", 200, mains_body())]).await;
        let dishes = catalog(&url).list_dishes(None).await.unwrap();
        assert!(dishes.iter().all(|d| d.category == DishCategory::Main));
    }

    #[tokio::test]
    async fn missing_main_sheet_is_invalid_data() {
        let (url, _) = fake_sheets(vec![("/values/Sides", 200, sides_body())]).await;
        let err = catalog(&url).list_dishes(None).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidData(_)));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let (url, _) = fake_sheets(vec![
            ("/values/Dishes", 503, "{}".to_string()),
            ("/values/Sides", 200, sides_body()),
        ])
        .await;
        let err = catalog(&url).list_dishes(None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let (url, hits) = fake_sheets(vec![
            ("/values/Dishes", 200, mains_body()),
            ("/values/Sides", 200, sides_body()),
        ])
        .await;
        let catalog = catalog(&url);
        catalog.list_dishes(None).await.unwrap();
        catalog.list_dishes(None).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
