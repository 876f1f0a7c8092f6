use serde::{Deserialize, Serialize};

/// Who is calling and which cluster they act for.
///
/// Passed explicitly into every service call. A `None` cluster means the
/// caller is not scoped to a cluster and no cluster filter is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub cluster: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: Option<String>, cluster: Option<String>) -> Self {
        Self {
            user_id: non_blank(user_id),
            cluster: non_blank(cluster),
        }
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
