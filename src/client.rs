//! HTTP access to the work package, listing and avatar endpoints of one
//! OpenProject instance.

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{OpenProjectError, Result};
use crate::responses::{
    Collection, ColoredElement, Link, NamedElement, PaginatedResult, WorkPackageElement,
};
use crate::types::{
    Linkable, Priority, Project, Status, User, UserAvatar, WorkPackage, WorkPackageType,
};

const API_PREFIX: &str = "/api/v3";

/// Trims user and project elements down to what the pickers display.
const SELECT_ID_AND_NAME: &str = "elements/id,elements/name";

const UNREADABLE_BODY: &str = "<failed to read response body>";

/// A client bound to one instance and one bearer token. All listing calls
/// return a single page; paging through results is the caller's loop.
pub struct ApiClient {
    http: Client,
    base: Url,
    server: String,
    token: String,
}

impl ApiClient {
    pub fn new(http: Client, server_url: &str, token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(server_url)
            .map_err(|_| OpenProjectError::InvalidUrl(server_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(OpenProjectError::InvalidUrl(server_url.to_string()));
        }
        Ok(Self {
            http,
            base,
            server: server_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// The instance URL without a trailing slash, as used in rewritten links.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn work_packages(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
        sort_by: &str,
    ) -> Result<PaginatedResult<WorkPackage>> {
        let collection = self
            .fetch_collection(&["work_packages"], offset, page_size, filters, sort_by, "")
            .await?;
        Ok(self.work_package_page(collection, offset, page_size))
    }

    pub async fn project_work_packages(
        &self,
        project: &str,
        offset: usize,
        page_size: usize,
        filters: &str,
        sort_by: &str,
    ) -> Result<PaginatedResult<WorkPackage>> {
        let collection = self
            .fetch_collection(
                &["projects", project, "work_packages"],
                offset,
                page_size,
                filters,
                sort_by,
                "",
            )
            .await?;
        Ok(self.work_package_page(collection, offset, page_size))
    }

    pub async fn users(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<User>> {
        let collection: Collection<NamedElement> = self
            .fetch_collection(&["users"], offset, page_size, filters, "", SELECT_ID_AND_NAME)
            .await?;
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let users = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| User {
                id: element.id,
                name: element.name,
                self_ref: Linkable {
                    href: Some(format!("{}/users/{}", self.server, element.id)),
                    title: None,
                },
            })
            .collect();
        Ok(PaginatedResult::new(users, offset, page_size, total))
    }

    pub async fn projects(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Project>> {
        let collection: Collection<NamedElement> = self
            .fetch_collection(
                &["projects"],
                offset,
                page_size,
                filters,
                "",
                SELECT_ID_AND_NAME,
            )
            .await?;
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let projects = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| Project {
                id: element.id,
                name: element.name,
                self_ref: Linkable {
                    href: Some(format!("{}/projects/{}", self.server, element.id)),
                    title: None,
                },
            })
            .collect();
        Ok(PaginatedResult::new(projects, offset, page_size, total))
    }

    pub async fn types(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<WorkPackageType>> {
        let collection: Collection<ColoredElement> = self
            .fetch_collection(&["types"], offset, page_size, filters, "", "")
            .await?;
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let types = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| WorkPackageType {
                id: element.id,
                name: element.name,
                color: element.color,
                self_ref: Linkable {
                    href: Some(format!("{}/types/{}/edit/settings", self.server, element.id)),
                    title: None,
                },
            })
            .collect();
        Ok(PaginatedResult::new(types, offset, page_size, total))
    }

    pub async fn statuses(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Status>> {
        let collection: Collection<ColoredElement> = self
            .fetch_collection(&["statuses"], offset, page_size, filters, "", "")
            .await?;
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let statuses = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| Status {
                id: element.id,
                name: element.name,
                color: element.color,
                self_ref: Linkable {
                    href: Some(format!("{}/statuses/{}/edit", self.server, element.id)),
                    title: None,
                },
            })
            .collect();
        Ok(PaginatedResult::new(statuses, offset, page_size, total))
    }

    pub async fn priorities(
        &self,
        offset: usize,
        page_size: usize,
        filters: &str,
    ) -> Result<PaginatedResult<Priority>> {
        let collection: Collection<ColoredElement> = self
            .fetch_collection(&["priorities"], offset, page_size, filters, "", "")
            .await?;
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let priorities = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| Priority {
                id: element.id,
                name: element.name,
                color: element.color,
                self_ref: Linkable {
                    href: Some(format!("{}/priorities/{}/edit", self.server, element.id)),
                    title: None,
                },
            })
            .collect();
        Ok(PaginatedResult::new(priorities, offset, page_size, total))
    }

    /// Fetches the avatar image of a user. A backend 404 becomes
    /// [`OpenProjectError::AvatarNotFound`] so callers can substitute a
    /// placeholder instead of reporting a failure.
    pub async fn user_avatar(&self, user_id: &str) -> Result<UserAvatar> {
        let url = self.endpoint(&["users", user_id, "avatar"])?;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| retrieval(&url, "the request could not be sent", Some(source)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(OpenProjectError::AvatarNotFound(user_id.to_string()));
        }
        if !status.is_success() {
            return Err(retrieval(
                &url,
                format!("the backend answered with status {status}"),
                None,
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(UserAvatar::new(content_type, response))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| OpenProjectError::InvalidUrl(self.server.clone()))?;
            path.pop_if_empty();
            path.extend(["api", "v3"]);
            path.extend(segments);
        }
        Ok(url)
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        offset: usize,
        page_size: usize,
        filters: &str,
        sort_by: &str,
        select: &str,
    ) -> Result<Collection<T>> {
        let mut url = self.endpoint(segments)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("offset", &offset.to_string());
            if !filters.is_empty() {
                query.append_pair("filters", filters);
            }
            if !sort_by.is_empty() {
                query.append_pair("sortBy", sort_by);
            }
            if !select.is_empty() {
                query.append_pair("select", select);
            }
            query.append_pair("pageSize", &page_size.to_string());
        }

        let response = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| retrieval(&url, "the request could not be sent", Some(source)))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
            return Err(OpenProjectError::BadRequest {
                url: url.to_string(),
                body,
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
            return Err(retrieval(
                &url,
                format!("the backend answered with status {status}: {body}"),
                None,
            ));
        }

        response.json().await.map_err(|source| {
            retrieval(&url, "the response body could not be decoded", Some(source))
        })
    }

    fn work_package_page(
        &self,
        collection: Collection<WorkPackageElement>,
        offset: usize,
        page_size: usize,
    ) -> PaginatedResult<WorkPackage> {
        let total = collection.total.unwrap_or(collection.embedded.elements.len());
        let items = collection
            .embedded
            .elements
            .into_iter()
            .map(|element| self.work_package_from_element(element))
            .collect();
        PaginatedResult::new(items, offset, page_size, total)
    }

    fn work_package_from_element(&self, element: WorkPackageElement) -> WorkPackage {
        let links = element.links;
        WorkPackage {
            id: element.id,
            record_type: element.record_type,
            subject: element.subject,
            description: element.description.and_then(|formattable| formattable.html),
            percentage_done: element.percentage_done,
            start_date: element.start_date.as_deref().and_then(day),
            due_date: element.due_date.as_deref().and_then(day),
            derived_start_date: element.derived_start_date.as_deref().and_then(day),
            derived_due_date: element.derived_due_date.as_deref().and_then(day),
            created_at: element.created_at.as_deref().and_then(day_of_timestamp),
            updated_at: element.updated_at.as_deref().and_then(day_of_timestamp),
            self_ref: self.activity_link(element.id, links.self_link),
            work_package_type: self.edit_link(links.work_package_type),
            status: self.edit_link(links.status),
            author: self.ui_link(links.author),
            assignee: self.ui_link(links.assignee),
            project: self.ui_link(links.project),
            priority: self.activity_link(element.id, links.priority),
        }
    }

    /// Rewrites an API href into the matching instance UI page.
    fn ui_link(&self, link: Option<Link>) -> Linkable {
        let Some(link) = link else {
            return Linkable::default();
        };
        Linkable {
            href: link
                .href
                .map(|href| format!("{}{}", self.server, strip_api_prefix(&href))),
            title: link.title,
        }
    }

    fn edit_link(&self, link: Option<Link>) -> Linkable {
        let Some(link) = link else {
            return Linkable::default();
        };
        Linkable {
            href: link
                .href
                .map(|href| format!("{}{}/edit", self.server, strip_api_prefix(&href))),
            title: link.title,
        }
    }

    /// Work packages have no dedicated UI page; both the record itself and
    /// its priority point at the activity view.
    fn activity_link(&self, id: i64, link: Option<Link>) -> Linkable {
        Linkable {
            href: Some(format!("{}/work_packages/{}/activity", self.server, id)),
            title: link.and_then(|link| link.title),
        }
    }
}

fn retrieval(
    url: &Url,
    message: impl Into<String>,
    source: Option<reqwest::Error>,
) -> OpenProjectError {
    OpenProjectError::Retrieval {
        url: url.to_string(),
        message: message.into(),
        source,
    }
}

fn strip_api_prefix(href: &str) -> &str {
    href.strip_prefix(API_PREFIX).unwrap_or(href)
}

/// Parses a plain `yyyy-mm-dd` value; anything else is treated as absent.
fn day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Timestamps only matter to the day; keep the date part and drop the rest.
fn day_of_timestamp(value: &str) -> Option<NaiveDate> {
    value.get(..10).and_then(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> ApiClient {
        ApiClient::new(Client::new(), &server.url(), "token").unwrap()
    }

    #[test]
    fn test_rejects_unparsable_server_url() {
        let result = ApiClient::new(Client::new(), "not a url", "token");
        assert!(matches!(result, Err(OpenProjectError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_joins_path_segments() {
        let client = ApiClient::new(Client::new(), "https://example.com/", "token").unwrap();
        let url = client.endpoint(&["users", "5", "avatar"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v3/users/5/avatar");
    }

    #[test]
    fn test_endpoint_keeps_instance_base_path() {
        let client =
            ApiClient::new(Client::new(), "https://example.com/openproject", "token").unwrap();
        let url = client.endpoint(&["types"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/openproject/api/v3/types");
    }

    #[test]
    fn test_day_rejects_blank_and_garbage() {
        assert_eq!(day("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(day(""), None);
        assert_eq!(day("soon"), None);
    }

    #[test]
    fn test_day_of_timestamp_keeps_the_date_part() {
        assert_eq!(
            day_of_timestamp("2024-03-05T10:31:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(day_of_timestamp("2024-03"), None);
    }

    #[tokio::test]
    async fn test_work_packages_map_the_response() {
        let mut server = Server::new_async().await;
        let body = r#"{
            "total": 120,
            "_embedded": {
                "elements": [{
                    "id": 42,
                    "_type": "WorkPackage",
                    "subject": "Fix the login page",
                    "description": {"raw": "Fix it", "html": "<p>Fix it</p>"},
                    "percentageDone": 40,
                    "startDate": "2024-03-01",
                    "dueDate": null,
                    "derivedDueDate": "2024-04-01",
                    "createdAt": "2024-02-20T08:00:00.000Z",
                    "updatedAt": "2024-03-05T10:31:00.000Z",
                    "_links": {
                        "self": {"href": "/api/v3/work_packages/42", "title": "Fix the login page"},
                        "type": {"href": "/api/v3/types/1", "title": "Task"},
                        "status": {"href": "/api/v3/statuses/7", "title": "In progress"},
                        "author": {"href": "/api/v3/users/5", "title": "Ada"},
                        "project": {"href": "/api/v3/projects/9", "title": "Website"},
                        "priority": {"href": "/api/v3/priorities/8", "title": "High"}
                    }
                }]
            }
        }"#;
        let mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "30".into()),
                Matcher::UrlEncoded("pageSize".into(), "15".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let page = client(&server).work_packages(30, 15, "", "").await.unwrap();
        mock.assert_async().await;

        assert_eq!(page.offset, 30);
        assert_eq!(page.page_size, 15);
        assert_eq!(page.total, 120);
        assert_eq!(page.items.len(), 1);

        let item = &page.items[0];
        let base = server.url();
        assert_eq!(item.id, 42);
        assert_eq!(item.subject, "Fix the login page");
        assert_eq!(item.description.as_deref(), Some("<p>Fix it</p>"));
        assert_eq!(item.percentage_done, 40);
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(item.due_date, None);
        assert_eq!(item.derived_due_date, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(item.created_at, NaiveDate::from_ymd_opt(2024, 2, 20));
        assert_eq!(item.updated_at, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(
            item.self_ref.href.as_deref(),
            Some(format!("{base}/work_packages/42/activity").as_str())
        );
        assert_eq!(item.self_ref.title.as_deref(), Some("Fix the login page"));
        assert_eq!(
            item.work_package_type.href.as_deref(),
            Some(format!("{base}/types/1/edit").as_str())
        );
        assert_eq!(item.work_package_type.title.as_deref(), Some("Task"));
        assert_eq!(
            item.status.href.as_deref(),
            Some(format!("{base}/statuses/7/edit").as_str())
        );
        assert_eq!(
            item.author.href.as_deref(),
            Some(format!("{base}/users/5").as_str())
        );
        assert!(item.assignee.is_empty());
        assert_eq!(
            item.priority.href.as_deref(),
            Some(format!("{base}/work_packages/42/activity").as_str())
        );
        assert_eq!(item.priority.title.as_deref(), Some("High"));
    }

    #[tokio::test]
    async fn test_work_packages_send_filters_and_sorting() {
        let mut server = Server::new_async().await;
        let filters = r#"[{"status":{"operator":"=","values":["1"]}}]"#;
        let sort_by = r#"[["id","asc"]]"#;
        let mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("filters".into(), filters.into()),
                Matcher::UrlEncoded("sortBy".into(), sort_by.into()),
                Matcher::UrlEncoded("pageSize".into(), "25".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 0, "_embedded": {"elements": []}}"#)
            .create_async()
            .await;

        let page = client(&server)
            .work_packages(0, 25, filters, sort_by)
            .await
            .unwrap();
        mock.assert_async().await;
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_empty_filters_are_not_sent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::Exact("offset=0&pageSize=25".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 0, "_embedded": {"elements": []}}"#)
            .create_async()
            .await;

        client(&server).work_packages(0, 25, "", "").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_project_work_packages_hit_the_project_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/projects/website/work_packages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 0, "_embedded": {"elements": []}}"#)
            .create_async()
            .await;

        client(&server)
            .project_work_packages("website", 0, 25, "", "")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_request_is_distinguished() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("unknown filter key")
            .create_async()
            .await;

        let error = client(&server)
            .work_packages(0, 25, "bogus", "")
            .await
            .unwrap_err();
        match error {
            OpenProjectError::BadRequest { body, .. } => assert_eq!(body, "unknown filter key"),
            other => panic!("expected a bad request error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_a_retrieval_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let error = client(&server)
            .work_packages(0, 25, "", "")
            .await
            .unwrap_err();
        match error {
            OpenProjectError::Retrieval { message, .. } => {
                assert!(message.contains("500"), "unexpected message: {message}");
                assert!(message.contains("boom"), "unexpected message: {message}");
            }
            other => panic!("expected a retrieval error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_users_select_id_and_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/users")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("select".into(), "elements/id,elements/name".into()),
                Matcher::UrlEncoded("pageSize".into(), "50".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"total": 2, "_embedded": {"elements": [
                    {"id": 5, "name": "Ada"},
                    {"id": 6, "name": "Grace"}
                ]}}"#,
            )
            .create_async()
            .await;

        let page = client(&server).users(0, 50, "").await.unwrap();
        mock.assert_async().await;

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Ada");
        assert_eq!(
            page.items[0].self_ref.href.as_deref(),
            Some(format!("{}/users/5", server.url()).as_str())
        );
        assert_eq!(page.items[0].self_ref.title, None);
    }

    #[tokio::test]
    async fn test_types_fall_back_to_the_element_count() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/types")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{"_embedded": {"elements": [
                    {"id": 1, "name": "Task", "color": "#1A67A3"},
                    {"id": 2, "name": "Milestone", "color": "#35C53F"},
                    {"id": 3, "name": "Phase", "color": "#FF922B"}
                ]}}"##,
            )
            .create_async()
            .await;

        let page = client(&server).types(0, 25, "").await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.offset, 0);
        assert_eq!(page.items[2].color, "#FF922B");
        assert_eq!(
            page.items[0].self_ref.href.as_deref(),
            Some(format!("{}/types/1/edit/settings", server.url()).as_str())
        );
    }

    #[tokio::test]
    async fn test_statuses_link_to_their_edit_page() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/statuses")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{"total": 1, "_embedded": {"elements": [
                    {"id": 7, "name": "In progress", "color": "#1A67A3"}
                ]}}"##,
            )
            .create_async()
            .await;

        let page = client(&server).statuses(0, 25, "").await.unwrap();
        assert_eq!(page.items[0].color, "#1A67A3");
        assert_eq!(
            page.items[0].self_ref.href.as_deref(),
            Some(format!("{}/statuses/7/edit", server.url()).as_str())
        );
    }

    #[tokio::test]
    async fn test_user_avatar_streams_the_image() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/users/5/avatar")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"png-bytes")
            .create_async()
            .await;

        let avatar = client(&server).user_avatar("5").await.unwrap();
        assert_eq!(avatar.content_type(), "image/png");
        assert_eq!(avatar.bytes().await.unwrap(), b"png-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_avatar_maps_to_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/users/5/avatar")
            .with_status(404)
            .create_async()
            .await;

        let error = client(&server).user_avatar("5").await.unwrap_err();
        assert!(matches!(error, OpenProjectError::AvatarNotFound(user) if user == "5"));
    }
}
