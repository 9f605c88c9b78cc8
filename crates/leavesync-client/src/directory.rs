use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::warn;

pub const UNKNOWN: &str = "未知";

#[derive(Clone, Debug)]
pub struct UserEntry {
    pub name: String,
    pub department_ids: Vec<i64>,
    pub main_department_id: i64,
}

#[derive(Deserialize)]
struct UserResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    department: Vec<i64>,
    #[serde(default)]
    main_department: i64,
}

#[derive(Deserialize)]
struct DepartmentResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    department: DepartmentBody,
}

#[derive(Deserialize, Default)]
struct DepartmentBody {
    #[serde(default)]
    name: String,
}

/// Process-lifetime caches for `userid -> UserEntry` and `deptId -> name`,
/// with no TTL (organizational data changes rarely enough that a process
/// restart is an acceptable refresh point).
#[derive(Default)]
pub struct Directory {
    users: Mutex<HashMap<String, UserEntry>>,
    departments: Mutex<HashMap<i64, String>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached lookup; on failure, warns and returns `None` so the caller can
    /// fall back to the `"未知"` placeholder.
    pub async fn user(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        token: &str,
        userid: &str,
    ) -> Option<UserEntry> {
        if let Some(cached) = self.users.lock().await.get(userid) {
            return Some(cached.clone());
        }

        let url = format!("{base_url}/cgi-bin/user/get");
        let resp = match http
            .get(&url)
            .query(&[("access_token", token), ("userid", userid)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(userid, error = %e, "user lookup transport error");
                return None;
            }
        };
        let parsed: UserResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(userid, error = %e, "user lookup response parse error");
                return None;
            }
        };
        if parsed.errcode != 0 {
            warn!(userid, code = parsed.errcode, msg = %parsed.errmsg, "user lookup rejected");
            return None;
        }

        let entry = UserEntry {
            name: parsed.name,
            department_ids: parsed.department,
            main_department_id: parsed.main_department,
        };
        self.users
            .lock()
            .await
            .insert(userid.to_string(), entry.clone());
        Some(entry)
    }

    pub async fn department(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        token: &str,
        dept_id: i64,
    ) -> Option<String> {
        if let Some(cached) = self.departments.lock().await.get(&dept_id) {
            return Some(cached.clone());
        }

        let url = format!("{base_url}/cgi-bin/department/get");
        let resp = match http
            .get(&url)
            .query(&[("access_token", token), ("id", &dept_id.to_string())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(dept_id, error = %e, "department lookup transport error");
                return None;
            }
        };
        let parsed: DepartmentResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(dept_id, error = %e, "department lookup response parse error");
                return None;
            }
        };
        if parsed.errcode != 0 {
            warn!(dept_id, code = parsed.errcode, msg = %parsed.errmsg, "department lookup rejected");
            return None;
        }

        self.departments
            .lock()
            .await
            .insert(dept_id, parsed.department.name.clone());
        Some(parsed.department.name)
    }
}
