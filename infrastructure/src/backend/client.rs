//! REST client for the coaching backend
//!
//! One [`HttpBackendClient`] implements every backend port plus the
//! reachability probe used by the offline queue.

use super::dto::{
    CompleteConversationBody, ConversationDto, CreateConversationBody, CreateGoalBody,
    CreatePersonaBody, CreateUserBody, GoalDto, MagicLinkBody, PersonaDto, TagsBody,
    UpdatePersonaBody, UserDto, VerifyDto,
};
use super::error::{HttpClientError, detail_message};
use async_trait::async_trait;
use bestself_application::{
    AuthPort, BackendError, ConnectivityProbe, ConversationRepository, GoalRepository,
    PersonaRepository,
};
use bestself_domain::{
    ConversationMessage, ConversationRecord, Goal, GoalPatch, NewConversation, NewGoal,
    NewPersona, NewUser, Persona, PersonaPatch, User,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub struct HttpBackendClient {
    client: Client,
    base_url: String,
    health_path: String,
}

impl HttpBackendClient {
    /// `timeout` of zero means no request timeout
    pub fn new(
        base_url: &str,
        health_path: &str,
        timeout: Duration,
    ) -> Result<Self, HttpClientError> {
        let mut builder = Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        info!("HttpBackendClient initialized for {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: format!("/{}", health_path.trim_start_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        self.client.request(method, self.url(path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HttpClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HttpClientError::Status {
            status,
            detail: detail_message(&body),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &'static str,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        Ok(response
            .json()
            .await
            .map_err(|source| HttpClientError::Decode { what, source })?)
    }

    async fn fetch_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        what: &'static str,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(self.request(method, path).json(body), what).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthPort for HttpBackendClient {
    async fn request_magic_link(&self, email: &str) -> Result<(), BackendError> {
        self.execute(
            self.request(Method::POST, "/auth/request")
                .json(&MagicLinkBody { email }),
        )
        .await
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        let request = self
            .request(Method::GET, "/auth/verify")
            .query(&[("token", token)]);
        let dto: VerifyDto = self.fetch(request, "verification").await?;
        Ok(dto.into())
    }

    async fn register(&self, user: &NewUser) -> Result<User, BackendError> {
        let dto: UserDto = self
            .fetch_json(Method::POST, "/users/", &CreateUserBody::from(user), "user")
            .await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl PersonaRepository for HttpBackendClient {
    async fn list(&self, user_id: &str) -> Result<Vec<Persona>, BackendError> {
        let path = format!("/users/{user_id}/personas");
        let dtos: Vec<PersonaDto> = self
            .fetch(self.request(Method::GET, &path), "personas")
            .await?;
        Ok(dtos.into_iter().map(Persona::from).collect())
    }

    async fn create(&self, persona: &NewPersona) -> Result<Persona, BackendError> {
        let dto: PersonaDto = self
            .fetch_json(
                Method::POST,
                "/personas/",
                &CreatePersonaBody::from(persona),
                "persona",
            )
            .await?;
        Ok(dto.into())
    }

    async fn update(&self, id: &str, patch: &PersonaPatch) -> Result<Persona, BackendError> {
        let dto: PersonaDto = self
            .fetch_json(
                Method::PUT,
                &format!("/personas/{id}"),
                &UpdatePersonaBody::from(patch),
                "persona",
            )
            .await?;
        Ok(dto.into())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.execute(self.request(Method::DELETE, &format!("/personas/{id}")))
            .await
    }
}

#[async_trait]
impl GoalRepository for HttpBackendClient {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Goal>, BackendError> {
        let path = format!("/users/{user_id}/goals");
        let dtos: Vec<GoalDto> = self.fetch(self.request(Method::GET, &path), "goals").await?;
        Ok(dtos.into_iter().map(Goal::from).collect())
    }

    async fn list_for_persona(&self, persona_id: &str) -> Result<Vec<Goal>, BackendError> {
        let path = format!("/personas/{persona_id}/goals");
        let dtos: Vec<GoalDto> = self.fetch(self.request(Method::GET, &path), "goals").await?;
        Ok(dtos.into_iter().map(Goal::from).collect())
    }

    async fn create(&self, goal: &NewGoal) -> Result<Goal, BackendError> {
        let dto: GoalDto = self
            .fetch_json(Method::POST, "/goals/", &CreateGoalBody::from(goal), "goal")
            .await?;
        Ok(dto.into())
    }

    async fn update(&self, id: &str, patch: &GoalPatch) -> Result<Goal, BackendError> {
        let dto: GoalDto = self
            .fetch_json(Method::PUT, &format!("/goals/{id}"), patch, "goal")
            .await?;
        Ok(dto.into())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.execute(self.request(Method::DELETE, &format!("/goals/{id}")))
            .await
    }
}

#[async_trait]
impl ConversationRepository for HttpBackendClient {
    async fn create(
        &self,
        conversation: &NewConversation,
    ) -> Result<ConversationRecord, BackendError> {
        let dto: ConversationDto = self
            .fetch_json(
                Method::POST,
                "/conversations/",
                &CreateConversationBody::from(conversation),
                "conversation",
            )
            .await?;
        Ok(dto.into())
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), BackendError> {
        let path = format!("/conversations/{conversation_id}/messages");
        self.execute(self.request(Method::POST, &path).json(message))
            .await
    }

    async fn complete(
        &self,
        conversation_id: &str,
        summary: &str,
        key_insights: &[String],
    ) -> Result<ConversationRecord, BackendError> {
        let body = CompleteConversationBody {
            conversation_summary: summary,
            key_insights,
        };
        let dto: ConversationDto = self
            .fetch_json(
                Method::PATCH,
                &format!("/conversations/{conversation_id}/complete"),
                &body,
                "conversation",
            )
            .await?;
        Ok(dto.into())
    }

    async fn add_tags(
        &self,
        conversation_id: &str,
        tags: &[String],
    ) -> Result<ConversationRecord, BackendError> {
        let dto: ConversationDto = self
            .fetch_json(
                Method::POST,
                &format!("/conversations/{conversation_id}/tags"),
                &TagsBody { tags },
                "conversation",
            )
            .await?;
        Ok(dto.into())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<ConversationRecord>, BackendError> {
        let request = self
            .request(Method::GET, "/conversations/search")
            .query(&[("user_id", user_id), ("q", query)]);
        let dtos: Vec<ConversationDto> = self.fetch(request, "conversations").await?;
        Ok(dtos.into_iter().map(ConversationRecord::from).collect())
    }
}

#[async_trait]
impl ConnectivityProbe for HttpBackendClient {
    async fn is_reachable(&self) -> bool {
        match self
            .send(self.request(Method::GET, &self.health_path))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Backend health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_normalised() {
        let client =
            HttpBackendClient::new("http://localhost:8000/", "health", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.url("/personas/"), "http://localhost:8000/personas/");
        assert_eq!(client.health_path, "/health");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_connectivity_error() {
        // Port 9 (discard) is closed on test machines
        let client =
            HttpBackendClient::new("http://127.0.0.1:9", "/health", Duration::from_secs(2))
                .unwrap();
        assert!(!client.is_reachable().await);
        let err = PersonaRepository::list(&client, "u1").await.unwrap_err();
        assert!(err.is_connectivity(), "{err:?}");
    }
}
