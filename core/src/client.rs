//! CGD provider client.
//!
//! Holds the authenticated session (cookie jar plus the fixed app headers the
//! provider expects) and exposes the balance call and the two paginated
//! record streams. Every request is issued serially: one list page at a time,
//! one detail fetch per record.

use std::pin::Pin;

use async_stream::try_stream;
use chrono::{Duration, Utc};
use futures::Stream;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client as HttpClient, Response, StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{self, Account, BalanceResponse, LoginResponse};

/// Production endpoint of the provider's mobile app API.
pub const DEFAULT_BASE_URL: &str = "https://app.caixadirecta.cgd.pt/cdoAppsAPI/rest/v1/";

/// Authenticated session with the provider.
///
/// [`CgdClient::login`] is the only way to obtain one and [`CgdClient::logout`]
/// consumes it, so a closed session cannot be reused; a fresh `login` starts
/// over from scratch.
#[derive(Debug)]
pub struct CgdClient {
    http: HttpClient,
    base_url: String,
    account: Account,
}

impl CgdClient {
    /// Authenticates and resolves the account the credentials map to.
    ///
    /// Requires exactly one account in the response; multi-account
    /// credentials are not supported.
    pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let http = HttpClient::builder()
            .default_headers(default_headers())
            .cookie_store(true)
            .build()?;

        let response = http
            .post(format!("{base_url}system/security/authentications/basic"))
            .query(&[("u", username), ("includeAccountsInResponse", "true")])
            .basic_auth(username, Some(password))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(auth_error(response).await);
        }

        let mut login: LoginResponse = response.json().await?;
        info!("account customer {}", login.customer_name);
        if login.accounts.len() != 1 {
            return Err(Error::UnsupportedAccount {
                count: login.accounts.len(),
            });
        }
        let account = login.accounts.remove(0);
        info!("account type {}", account.account_type);
        info!("account description {}", account.description);
        info!("account iban {}", account.iban);

        Ok(CgdClient {
            http,
            base_url,
            account,
        })
    }

    /// Invalidates the server-side session.
    ///
    /// Consumes the client, so the local handle is released even when the
    /// server call fails.
    pub async fn logout(self) -> Result<()> {
        let response = self
            .http
            .delete(format!(
                "{}system/security/authentications/current",
                self.base_url
            ))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(auth_error(response).await);
        }
        Ok(())
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Current per-currency balances.
    pub async fn account_balance(&self) -> Result<BalanceResponse> {
        let response = self.http.get(self.account_url("/balances")).send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_account_balance", response).await);
        }
        Ok(response.json().await?)
    }

    /// Lazy stream of detail-enriched transactions, ascending by book date.
    ///
    /// Covers all available history (the provider typically retains about two
    /// years); the upper bound is tomorrow so same-day transactions across
    /// timezone boundaries are included. Each yielded record carries the
    /// detail sub-object attached under `details`.
    pub fn transactions(&self) -> Pin<Box<dyn Stream<Item = Result<Value>> + Send + '_>> {
        let from_book_date = "2000-01-01".to_string();
        let to_book_date = (Utc::now() + Duration::days(1)).format("%Y-%m-%d").to_string();

        Box::pin(try_stream! {
            let mut page_key: Option<String> = None;
            loop {
                let page = self
                    .transactions_page(&from_book_date, &to_book_date, page_key.as_deref())
                    .await?;
                page_key = page.next_page_key.filter(|key| !key.is_empty());
                debug!(
                    count = page.transactions.len(),
                    more = page_key.is_some(),
                    "fetched transactions page"
                );

                for mut transaction in page.transactions {
                    let id = model::record_id(&transaction, "transactionId")?.to_string();
                    ensure_not_enriched(&transaction, "details", "transaction", &id)?;
                    let details = self.transaction_details(&id).await?;
                    if let Some(map) = transaction.as_object_mut() {
                        map.insert("details".to_string(), details);
                    }
                    yield transaction;
                }

                if page_key.is_none() {
                    break;
                }
            }
        })
    }

    async fn transactions_page(
        &self,
        from_book_date: &str,
        to_book_date: &str,
        page_key: Option<&str>,
    ) -> Result<TransactionsPage> {
        let mut request = self
            .http
            .get(self.account_url("/transactions"))
            .query(&[
                ("fromBookDate", from_book_date),
                ("toBookDate", to_book_date),
                ("sort", "+bookDate"),
            ]);
        if let Some(key) = page_key {
            request = request.query(&[("pageKey", key)]);
        }
        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_account_transactions", response).await);
        }
        Ok(response.json().await?)
    }

    /// Lazy stream of documents enriched with their `contents` payload.
    ///
    /// The lower date bound comes from the provider's document configuration
    /// endpoint rather than being hardcoded.
    pub fn documents(&self) -> Pin<Box<dyn Stream<Item = Result<Value>> + Send + '_>> {
        let to_date = (Utc::now() + Duration::days(1))
            .format("%Y-%m-%dT00:00:00Z")
            .to_string();

        Box::pin(try_stream! {
            let from_date = self.document_configurations().await?.minimum_date;
            let mut page_key: Option<String> = None;
            loop {
                let page = self
                    .documents_page(&from_date, &to_date, page_key.as_deref())
                    .await?;
                page_key = page.next_page_key.filter(|key| !key.is_empty());
                debug!(
                    count = page.documents.len(),
                    more = page_key.is_some(),
                    "fetched documents page"
                );

                for mut document in page.documents {
                    let id = model::record_id(&document, "documentId")?.to_string();
                    ensure_not_enriched(&document, "contents", "document", &id)?;
                    let contents = self.document_contents(&id).await?;
                    if let Some(map) = document.as_object_mut() {
                        map.insert("contents".to_string(), contents);
                    }
                    yield document;
                }

                if page_key.is_none() {
                    break;
                }
            }
        })
    }

    async fn documents_page(
        &self,
        from_date: &str,
        to_date: &str,
        page_key: Option<&str>,
    ) -> Result<DocumentsPage> {
        let mut request = self
            .http
            .get(format!("{}business/documents", self.base_url))
            .query(&[("fromDate", from_date), ("toDate", to_date)]);
        if let Some(key) = page_key {
            request = request.query(&[("pageKey", key)]);
        }
        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_documents", response).await);
        }
        Ok(response.json().await?)
    }

    async fn transaction_details(&self, id: &str) -> Result<Value> {
        let url = format!(
            "{}/{}",
            self.account_url("/transactions"),
            urlencoding::encode(id)
        );
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_account_transaction_details", response).await);
        }
        Ok(response.json().await?)
    }

    async fn document_configurations(&self) -> Result<DocumentConfigurations> {
        let url = format!("{}business/documents/configurations", self.base_url);
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_document_configurations", response).await);
        }
        Ok(response.json().await?)
    }

    async fn document_contents(&self, id: &str) -> Result<Value> {
        let url = format!(
            "{}business/documents/{}/contents",
            self.base_url,
            urlencoding::encode(id)
        );
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(api_error("get_document_contents", response).await);
        }
        let mut body: Value = response.json().await?;
        body.as_object_mut()
            .and_then(|map| map.remove("documentContents"))
            .ok_or_else(|| Error::Invariant {
                message: format!(
                    "contents response for document {id} has no documentContents field"
                ),
            })
    }

    fn account_url(&self, suffix: &str) -> String {
        format!(
            "{}business/accounts/{}{}",
            self.base_url,
            urlencoding::encode(&self.account.full_account_key),
            suffix
        )
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert("X-CGD-APP-Device", HeaderValue::from_static("as3"));
    headers.insert("X-CGD-APP-Version", HeaderValue::from_static("1.0"));
    headers.insert("X-CGD-APP-Language", HeaderValue::from_static("pt-PT"));
    headers
}

// A list record carrying the enrichment field before the detail fetch means
// the provider's API shape changed under us.
fn ensure_not_enriched(record: &Value, field: &str, kind: &str, id: &str) -> Result<()> {
    if record.get(field).is_some() {
        return Err(Error::Invariant {
            message: format!("{kind} {id} already carries a {field} field"),
        });
    }
    Ok(())
}

async fn auth_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Auth { status, body }
}

async fn api_error(operation: &'static str, response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Api {
        operation,
        status,
        body,
    }
}

// Paginated list envelopes. `nextPageKey` is absent or null on the last page.
#[derive(Deserialize)]
struct TransactionsPage {
    #[serde(rename = "nextPageKey", default)]
    next_page_key: Option<String>,
    transactions: Vec<Value>,
}

#[derive(Deserialize)]
struct DocumentsPage {
    #[serde(rename = "nextPageKey", default)]
    next_page_key: Option<String>,
    documents: Vec<Value>,
}

#[derive(Deserialize)]
struct DocumentConfigurations {
    #[serde(rename = "minimumDate")]
    minimum_date: String,
}
