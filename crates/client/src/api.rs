//! Typed access to the remote REST API.
//!
//! Public endpoints (login, register, refresh) go through a logging-only
//! pipeline; everything else goes through the authenticated pipeline.

use std::sync::Arc;

use api_types::{
    ErrorBody,
    category::{CategoryNew, CategoryView, EstimationUpdate},
    savings::SavingsBalance,
    transaction::{StatementParse, TransactionWrite},
    user::{LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, TokenPair},
};
use async_trait::async_trait;
use engine::{
    Category, MoneyCents, Transaction, TransactionDraft,
    estimations::EstimationChange,
    import::PendingTransaction,
    savings::SavingsMovement,
    store::KeyValueStore,
};
use reqwest::{Method, RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{
    ClientError, Result,
    auth::{Authenticator, TokenRefresher},
    convert,
    credentials::TokenStore,
    pipeline::{BearerAuth, Pipeline, RequestLogging},
};

/// Base URL plus the pipeline used to reach it.
#[derive(Clone)]
pub(crate) struct Remote {
    base_url: String,
    pipeline: Pipeline,
}

impl Remote {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.pipeline.http().request(method, self.url(path))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.pipeline.execute(builder.build()?).await
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder, fallback: &str) -> Result<T> {
        let response = checked(self.send(builder).await?, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::InvalidServerResponse(err.to_string()))
    }

    async fn unit(&self, builder: RequestBuilder, fallback: &str) -> Result<()> {
        checked(self.send(builder).await?, fallback).await?;
        Ok(())
    }
}

/// Passes successful responses through and turns the others into
/// [`ClientError::Server`], preferring the server's own message.
async fn checked(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            message: Some(message),
        }) if !message.trim().is_empty() => message,
        _ => fallback.to_string(),
    };
    Err(ClientError::Server { status, message })
}

/// Refreshes tokens through `POST /user/refresh`.
pub struct HttpRefresher {
    remote: Remote,
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.remote
            .json(
                self.remote.request(Method::POST, "/user/refresh").json(&body),
                "could not refresh the session",
            )
            .await
    }
}

#[derive(Clone)]
pub struct ApiClient {
    public: Remote,
    private: Remote,
    auth: Arc<Authenticator>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_http(base_url, store, reqwest::Client::new())
    }

    pub fn with_http(base_url: &str, store: Arc<dyn KeyValueStore>, http: reqwest::Client) -> Self {
        let public = Remote {
            base_url: base_url.to_string(),
            pipeline: Pipeline::new(http.clone()).with_stage(Arc::new(RequestLogging)),
        };
        let refresher = Arc::new(HttpRefresher {
            remote: public.clone(),
        });
        let auth = Arc::new(Authenticator::new(TokenStore::new(store), refresher));
        let private = Remote {
            base_url: base_url.to_string(),
            pipeline: Pipeline::new(http)
                .with_stage(Arc::new(BearerAuth::new(auth.clone())))
                .with_stage(Arc::new(RequestLogging)),
        };
        Self {
            public,
            private,
            auth,
        }
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    pub fn tokens(&self) -> &TokenStore {
        self.auth.tokens()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.public
            .json(
                self.public.request(Method::POST, "/user/login").json(&body),
                "login failed",
            )
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.public
            .unit(
                self.public.request(Method::POST, "/user/register").json(request),
                "registration failed",
            )
            .await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let views: Vec<CategoryView> = self
            .private
            .json(
                self.private.request(Method::GET, "/categories"),
                "could not load categories",
            )
            .await?;
        Ok(views.into_iter().map(convert::category).collect())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("category name is required".to_string()));
        }
        let view: CategoryView = self
            .private
            .json(
                self.private.request(Method::POST, "/categories").json(&CategoryNew {
                    name: name.to_string(),
                }),
                "could not create the category",
            )
            .await?;
        Ok(convert::category(view))
    }

    /// Categories with their estimations. Falls back to the plain listing
    /// (zero estimations) when the estimation endpoint fails.
    pub async fn categories_with_estimations(&self) -> Result<Vec<Category>> {
        let result: Result<Vec<CategoryView>> = self
            .private
            .json(
                self.private.request(Method::GET, "/categories/estimations"),
                "could not load estimations",
            )
            .await;
        match result {
            Ok(views) => Ok(views.into_iter().map(convert::category).collect()),
            Err(err) if err.is_auth() => Err(err),
            Err(err) => {
                warn!(%err, "estimations unavailable, using plain categories");
                let mut categories = self.categories().await?;
                for category in &mut categories {
                    category.estimated_expense = MoneyCents::ZERO;
                    category.estimated_income = MoneyCents::ZERO;
                }
                Ok(categories)
            }
        }
    }

    pub async fn category_estimations(&self, category_id: &str) -> Result<EstimationUpdate> {
        self.private
            .json(
                self.private
                    .request(Method::GET, &format!("/categories/{category_id}/estimations")),
                "could not load the category estimations",
            )
            .await
    }

    pub async fn update_estimations(&self, change: &EstimationChange) -> Result<()> {
        let body = EstimationUpdate {
            estimation_depenses: change.expense.to_major().max(0.0),
            estimation_revenus: change.income.to_major().max(0.0),
        };
        self.private
            .unit(
                self.private
                    .request(
                        Method::PUT,
                        &format!("/categories/{}/estimations", change.category_id),
                    )
                    .json(&body),
                "could not save the estimations",
            )
            .await
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        let rows: Vec<Value> = self
            .private
            .json(
                self.private.request(Method::GET, "/transactions"),
                "could not load transactions",
            )
            .await?;
        Ok(convert::transactions(rows))
    }

    pub async fn latest_transactions(&self) -> Result<Vec<Transaction>> {
        let rows: Vec<Value> = self
            .private
            .json(
                self.private.request(Method::GET, "/transactions/latest"),
                "could not load the latest transactions",
            )
            .await?;
        Ok(convert::transactions(rows))
    }

    async fn post_transaction(&self, body: &TransactionWrite) -> Result<()> {
        self.private
            .unit(
                self.private.request(Method::POST, "/transactions").json(body),
                "could not create the transaction",
            )
            .await
    }

    pub async fn create_transaction(&self, draft: &TransactionDraft) -> Result<()> {
        self.post_transaction(&convert::write_from_draft(draft)).await
    }

    pub async fn create_imported(&self, row: &PendingTransaction) -> Result<()> {
        self.post_transaction(&convert::write_from_pending(row)).await
    }

    pub async fn update_transaction(&self, id: &str, draft: &TransactionDraft) -> Result<()> {
        self.private
            .unit(
                self.private
                    .request(Method::PUT, &format!("/transactions/{id}"))
                    .json(&convert::write_from_draft(draft)),
                "could not update the transaction",
            )
            .await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.private
            .unit(
                self.private.request(Method::DELETE, &format!("/transactions/{id}")),
                "could not delete the transaction",
            )
            .await
    }

    /// Uploads a statement for server-side parsing.
    pub async fn parse_statement(&self, file_name: &str, document: Vec<u8>) -> Result<StatementParse> {
        let part = multipart::Part::bytes(document)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("pdfFile", part);
        self.private
            .json(
                self.private
                    .request(Method::POST, "/transactions/parse-ccf")
                    .query(&[("format", "structured")])
                    .multipart(form),
                "could not parse the statement",
            )
            .await
    }

    pub async fn savings_balance(&self, user_id: &str) -> Result<MoneyCents> {
        let balance: SavingsBalance = self
            .private
            .json(
                self.private.request(Method::GET, &format!("/epargne/{user_id}")),
                "could not load the savings account",
            )
            .await?;
        Ok(MoneyCents::from_major(balance.value()))
    }

    /// Applies a movement and returns the new balance.
    pub async fn move_savings(&self, user_id: &str, movement: SavingsMovement) -> Result<MoneyCents> {
        let amount = movement.amount().to_major().to_string();
        let builder = match movement {
            SavingsMovement::Add(_) => self
                .private
                .request(Method::PUT, &format!("/epargne/{user_id}/add"))
                .query(&[("addValue", amount)]),
            SavingsMovement::Remove(_) => self
                .private
                .request(Method::PUT, &format!("/epargne/{user_id}/remove"))
                .query(&[("removeValue", amount)]),
        };
        let balance: SavingsBalance = self
            .private
            .json(builder, "could not update the savings account")
            .await?;
        Ok(MoneyCents::from_major(balance.value()))
    }
}
