// src/client.rs

//! HTTP client for the exam API, used by the terminal front end.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        exam::{ExamResult, QuestionsResponse, SubmissionResponse},
        question::PublicQuestion,
        user::{AuthResponse, LoginRequest, RegisterRequest, VerifiedIdentity},
    },
    session::{Grader, Submission},
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let token = self.token.as_deref().ok_or(AppError::Unauthorized)?;
        Ok(request.bearer_auth(token))
    }

    /// Registers and keeps the issued token for later calls.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.post_json("/auth/register", &body, false).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Logs in and keeps the issued token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.post_json("/auth/login", &body, false).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn verify(&self) -> Result<VerifiedIdentity, AppError> {
        let request = self.authorized(self.http.get(self.url("/auth/verify")))?;
        decode(send(request).await?).await
    }

    pub async fn fetch_questions(&self) -> Result<QuestionsResponse, AppError> {
        let request = self.authorized(self.http.get(self.url("/exam/questions")))?;
        decode(send(request).await?).await
    }

    pub async fn submit(
        &self,
        submission: &Submission<PublicQuestion>,
    ) -> Result<SubmissionResponse, AppError> {
        let body = json!({
            "answers": submission.answers,
            "questions": submission.questions,
        });
        self.post_json("/exam/submit", &body, true).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, with_auth: bool) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(self.url(path)).json(body);
        if with_auth {
            request = self.authorized(request)?;
        }
        decode(send(request).await?).await
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Response, AppError> {
    request
        .send()
        .await
        .map_err(|e| AppError::InternalError(format!("request failed: {}", e)))
}

/// Decodes a success body, or maps an error body back onto `AppError`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| AppError::InternalError(format!("unexpected response: {}", e)));
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED => match message.as_str() {
            "Invalid email or password" => AppError::InvalidCredentials,
            "No token provided" => AppError::Unauthorized,
            _ => AppError::InvalidToken,
        },
        StatusCode::BAD_REQUEST => match message.as_str() {
            "User already exists with this email" => AppError::DuplicateEmail,
            "No questions available" => AppError::NoQuestionsAvailable,
            m if m.starts_with("Invalid submission data: ") => AppError::MalformedSubmission(
                m.trim_start_matches("Invalid submission data: ").to_string(),
            ),
            _ => AppError::InvalidInput(message),
        },
        _ => AppError::InternalError(message),
    })
}

/// Grades a session by submitting it to the server.
pub struct HttpGrader {
    client: ApiClient,
}

impl HttpGrader {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Grader<PublicQuestion> for HttpGrader {
    async fn grade(&self, submission: Submission<PublicQuestion>) -> Result<ExamResult, AppError> {
        Ok(self.client.submit(&submission).await?.result)
    }
}
