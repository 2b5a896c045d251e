use crate::domain::models::{CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct DeleteEventResponse {
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreateUserResponse {
    pub msg: String,
}

#[async_trait]
pub trait EventsApiClient: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, InfraError>;

    async fn get_event(&self, event_id: &str) -> Result<Event, InfraError>;

    async fn create_event(&self, dto: &CreateEventDto) -> Result<Event, InfraError>;

    async fn update_event(&self, dto: &UpdateEventDto) -> Result<Event, InfraError>;

    async fn delete_event(&self, event_id: &str) -> Result<DeleteEventResponse, InfraError>;

    async fn create_user(&self) -> Result<CreateUserResponse, InfraError>;
}

#[derive(Debug, serde::Serialize)]
struct EventPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl<'a> EventPayload<'a> {
    fn from_create(dto: &'a CreateEventDto) -> Self {
        Self {
            id: None,
            title: &dto.title,
            description: dto.description.as_deref(),
            date: dto.event_date().format("%Y-%m-%dT%H:%M:%S").to_string(),
            time: dto.time.map(|time| time.format("%H:%M").to_string()),
        }
    }

    fn from_update(dto: &'a UpdateEventDto) -> Self {
        Self {
            id: Some(&dto.id),
            title: &dto.title,
            description: dto.description.as_deref(),
            date: dto.event_date().format("%Y-%m-%dT%H:%M:%S").to_string(),
            time: dto.time.map(|time| time.format("%H:%M").to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestEventsApiClient {
    client: Client,
    base_url: Url,
}

impl ReqwestEventsApiClient {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let base_url = Url::parse(api_base_url.trim()).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid apiBaseUrl '{api_base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::InvalidConfig(format!(
                "apiBaseUrl '{api_base_url}' cannot be a base"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                InfraError::Transport(format!("failed to build http client: {error}"))
            })?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| InfraError::InvalidConfig("apiBaseUrl cannot be a base".to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn http_error(status: StatusCode, body: &str, resource: &str) -> InfraError {
        if status == StatusCode::NOT_FOUND {
            return InfraError::NotFound(resource.to_string());
        }
        let message = if body.trim().is_empty() {
            format!("events api error: http {}", status.as_u16())
        } else {
            format!("events api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Transport(message)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        action: &str,
        resource: &str,
    ) -> Result<T, InfraError> {
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Transport(format!("failed reading {action} response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body, resource));
        }

        serde_json::from_str(&body).map_err(|error| {
            InfraError::Transport(format!("invalid {action} payload: {error}; body={body}"))
        })
    }
}

#[async_trait]
impl EventsApiClient for ReqwestEventsApiClient {
    async fn list_events(&self) -> Result<Vec<Event>, InfraError> {
        let endpoint = self.endpoint(&["calendar", "events"])?;
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while listing events: {error}"))
            })?;
        Self::read_json(response, "events list", "events").await
    }

    async fn get_event(&self, event_id: &str) -> Result<Event, InfraError> {
        let endpoint = self.endpoint(&["calendar", "events", event_id])?;
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while loading event: {error}"))
            })?;
        Self::read_json(response, "event", event_id).await
    }

    async fn create_event(&self, dto: &CreateEventDto) -> Result<Event, InfraError> {
        let endpoint = self.endpoint(&["calendar", "events", "create"])?;
        let response = self
            .client
            .post(endpoint)
            .json(&EventPayload::from_create(dto))
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while creating event: {error}"))
            })?;
        Self::read_json(response, "event create", "event").await
    }

    async fn update_event(&self, dto: &UpdateEventDto) -> Result<Event, InfraError> {
        let endpoint = self.endpoint(&["calendar", "events", "update"])?;
        let response = self
            .client
            .post(endpoint)
            .json(&EventPayload::from_update(dto))
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while updating event: {error}"))
            })?;
        Self::read_json(response, "event update", &dto.id).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<DeleteEventResponse, InfraError> {
        let endpoint = self.endpoint(&["calendar", "events", event_id])?;
        let response = self
            .client
            .delete(endpoint)
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while deleting event: {error}"))
            })?;
        Self::read_json(response, "event delete", event_id).await
    }

    async fn create_user(&self) -> Result<CreateUserResponse, InfraError> {
        let endpoint = self.endpoint(&["calendar", "user", "create"])?;
        let response = self
            .client
            .post(endpoint)
            .send()
            .await
            .map_err(|error| {
                InfraError::Transport(format!("network error while creating user: {error}"))
            })?;
        Self::read_json(response, "user create", "user").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn client(base: &str) -> ReqwestEventsApiClient {
        ReqwestEventsApiClient::new(base, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn endpoints_are_relative_to_base_path() {
        let with_slash = client("https://calendar.test/api/");
        assert_eq!(
            with_slash.endpoint(&["calendar", "events"]).expect("endpoint").as_str(),
            "https://calendar.test/api/calendar/events"
        );

        let without_slash = client("https://calendar.test/api");
        assert_eq!(
            without_slash
                .endpoint(&["calendar", "events", "create"])
                .expect("endpoint")
                .as_str(),
            "https://calendar.test/api/calendar/events/create"
        );
    }

    #[test]
    fn event_ids_are_percent_encoded_as_one_segment() {
        let api = client("https://calendar.test/");
        assert_eq!(
            api.endpoint(&["calendar", "events", "a/b c"]).expect("endpoint").as_str(),
            "https://calendar.test/calendar/events/a%2Fb%20c"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let error = ReqwestEventsApiClient::new("not a url", Duration::from_secs(5))
            .expect_err("invalid url");
        assert!(matches!(error, InfraError::InvalidConfig(_)));
        let error =
            ReqwestEventsApiClient::new("mailto:someone@calendar.test", Duration::from_secs(5))
                .expect_err("cannot be a base");
        assert!(matches!(error, InfraError::InvalidConfig(_)));
    }

    #[test]
    fn not_found_status_maps_to_not_found() {
        assert!(
            ReqwestEventsApiClient::http_error(StatusCode::NOT_FOUND, "", "evt-1").is_not_found()
        );
        let error =
            ReqwestEventsApiClient::http_error(StatusCode::BAD_GATEWAY, "upstream down", "evt-1");
        assert_eq!(
            error.to_string(),
            "Transport error: events api error: http 502; body=upstream down"
        );
    }

    #[test]
    fn payload_omits_absent_optional_fields() {
        let dto = CreateEventDto {
            title: "Gym".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 15).expect("valid date"),
            time: NaiveTime::from_hms_opt(7, 45, 0),
        };
        let value =
            serde_json::to_value(EventPayload::from_create(&dto)).expect("serialize payload");
        assert_eq!(
            value,
            serde_json::json!({"title": "Gym", "date": "2024-02-15T07:45:00", "time": "07:45"})
        );

        let update = UpdateEventDto {
            id: "evt-9".to_string(),
            title: "Gym".to_string(),
            description: Some("legs".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 2, 16).expect("valid date"),
            time: None,
        };
        let value =
            serde_json::to_value(EventPayload::from_update(&update)).expect("serialize payload");
        assert_eq!(
            value,
            serde_json::json!({
                "id": "evt-9",
                "title": "Gym",
                "description": "legs",
                "date": "2024-02-16T00:00:00"
            })
        );
    }
}
