use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const SEARCH_MAX_RESULTS: u32 = 100;

#[derive(Error, Debug)]
pub enum CmdbError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

/// Connection settings for the Jira-backed configuration database.
#[derive(Debug, Clone)]
pub struct CmdbConfig {
    pub base_url: String,
    pub user: String,
    pub token: String,
    pub project: String,
    pub issue_type: String,
}

impl CmdbConfig {
    pub fn from_env() -> Result<Self, CmdbError> {
        let var = |name: &'static str| {
            std::env::var(name).map_err(|_| CmdbError::MissingEnv(name))
        };

        Ok(Self {
            base_url: var("JIRA_URL")?.trim_end_matches('/').to_string(),
            user: var("JIRA_USER")?,
            token: var("JIRA_TOKEN")?,
            project: std::env::var("CMDB_PROJECT").unwrap_or_else(|_| "CMDB".to_string()),
            issue_type: std::env::var("CMDB_ISSUE_TYPE")
                .unwrap_or_else(|_| "Configuration Item".to_string()),
        })
    }
}

/// One configuration item tracked in the CMDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub summary: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    summary: String,
    status: IssueStatus,
}

#[derive(Debug, Deserialize)]
struct IssueStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    key: String,
}

pub struct CmdbClient {
    config: CmdbConfig,
    client: reqwest::Client,
}

impl CmdbClient {
    pub fn new(config: CmdbConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self, CmdbError> {
        Ok(Self::new(CmdbConfig::from_env()?))
    }

    /// List configuration items, optionally narrowed by an extra JQL clause.
    pub async fn query_items(&self, jql: Option<&str>) -> Result<Vec<ConfigItem>, CmdbError> {
        let base_jql = format!("project = {}", self.config.project);
        let full_jql = match jql {
            Some(extra) => format!("{} AND {}", base_jql, extra),
            None => base_jql,
        };

        let url = format!("{}/rest/api/2/search", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .query(&[
                ("jql", full_jql.as_str()),
                ("maxResults", &SEARCH_MAX_RESULTS.to_string()),
            ])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let search: SearchResponse = response.json().await?;

        Ok(search
            .issues
            .into_iter()
            .map(|issue| ConfigItem {
                key: issue.key,
                summary: issue.fields.summary,
                status: issue.fields.status.name,
            })
            .collect())
    }

    /// Update fields on an existing configuration item.
    pub async fn update_item(&self, key: &str, fields: Value) -> Result<(), CmdbError> {
        let url = format!("{}/rest/api/2/issue/{}", self.config.base_url, key);
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Create a configuration item and return its issue key.
    pub async fn create_item(
        &self,
        summary: &str,
        description: &str,
        additional_fields: Option<Value>,
    ) -> Result<String, CmdbError> {
        let mut fields = json!({
            "project": { "key": self.config.project },
            "issuetype": { "name": self.config.issue_type },
            "summary": summary,
            "description": description,
        });

        if let (Some(map), Some(Value::Object(extra))) =
            (fields.as_object_mut(), additional_fields)
        {
            for (name, value) in extra {
                map.insert(name, value);
            }
        }

        let url = format!("{}/rest/api/2/issue", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let created: CreateResponse = response.json().await?;
        Ok(created.key)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CmdbError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CmdbError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            })
        }
    }
}
