use serde::Deserialize;

/// Body of `GET /users`.
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub value: Vec<GraphUser>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail: Option<String>,
    pub assigned_licenses: Option<Vec<AssignedLicense>>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedLicense {
    pub sku_id: Option<String>,
    #[serde(default)]
    pub disabled_plans: Vec<String>,
}
