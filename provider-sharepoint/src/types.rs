//! Microsoft Graph response types
//!
//! Data structures for deserializing Graph v1.0 site, drive and driveItem
//! resources, plus the conversion from a driveItem to a
//! [`DocumentDescriptor`].

use chrono::{DateTime, Utc};
use core_library::models::{DocumentDescriptor, DEFAULT_MIME_TYPE, UNKNOWN_LIBRARY};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SharePointError};

/// Site resource
///
/// See: https://learn.microsoft.com/graph/api/resources/site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSite {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Drive (document library) resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDrive {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl GraphDrive {
    pub fn library_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_LIBRARY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySet {
    #[serde(default)]
    pub user: Option<Identity>,
}

/// driveItem resource
///
/// Exactly one of `file` or `folder` is set for the items the harvester
/// cares about; anything else (notebooks, packages) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub file: Option<FileFacet>,
    #[serde(default)]
    pub folder: Option<FolderFacet>,
    #[serde(default)]
    pub created_by: Option<IdentitySet>,
    /// Pre-authenticated URL, valid for about an hour
    #[serde(rename = "@microsoft.graph.downloadUrl", default)]
    pub download_url: Option<String>,
}

impl DriveItem {
    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Display name of the creator, if Graph reported one.
    pub fn author(&self) -> Option<&str> {
        self.created_by
            .as_ref()?
            .user
            .as_ref()?
            .display_name
            .as_deref()
    }

    /// Build the descriptor for a file item found in `drive` under
    /// `folder_path`.
    pub fn to_descriptor(
        &self,
        drive: &GraphDrive,
        folder_path: &str,
        discovered_at: DateTime<Utc>,
    ) -> DocumentDescriptor {
        let mut doc = DocumentDescriptor::new(self.name_or_empty(), &drive.id, &self.id);
        doc.library_name = drive.library_name().to_string();
        doc.folder_path = folder_path.to_string();
        doc.size_bytes = self.size.unwrap_or(0);
        doc.created_at = parse_graph_time(self.created_date_time.as_deref());
        doc.modified_at = parse_graph_time(self.last_modified_date_time.as_deref());
        doc.mime_type = self
            .file
            .as_ref()
            .and_then(|f| f.mime_type.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        doc.direct_download_url = self.download_url.clone().filter(|u| !u.is_empty());
        doc.web_url = self.web_url.clone().filter(|u| !u.is_empty());
        doc.discovered_at = Some(discovered_at);
        doc
    }
}

fn parse_graph_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One page of a Graph collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page; followed verbatim
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Signed-in user, from `/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
}

impl GraphUser {
    /// Mail address, falling back to the principal name.
    pub fn email(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .or(self.user_principal_name.as_deref())
    }
}

/// Outcome of a connection test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub site: GraphSite,
    pub drive_count: usize,
    /// `None` if `/me` could not be read; not fatal for the test
    pub user: Option<GraphUser>,
}

/// A site URL split into the parts Graph addresses sites by.
///
/// `https://contoso.sharepoint.com/sites/Finance` becomes hostname
/// `contoso.sharepoint.com` and path `sites/Finance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAddress {
    pub hostname: String,
    /// Server-relative path without leading or trailing slashes
    pub path: String,
}

impl SiteAddress {
    pub fn parse(site_url: &str) -> Result<Self> {
        let url: Url = core_runtime::config::validate_site_url(site_url)
            .map_err(|e| SharePointError::InvalidSiteUrl(e.to_string()))?;

        let hostname = url
            .host_str()
            .ok_or_else(|| SharePointError::InvalidSiteUrl(site_url.to_string()))?
            .to_string();
        let path = url.path().trim_matches('/').to_string();

        Ok(Self { hostname, path })
    }

    /// Site key for `GET /sites/{key}`.
    pub fn graph_key(&self) -> String {
        if self.path.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}:/{}", self.hostname, self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_site_address_parse() {
        let address = SiteAddress::parse("https://contoso.sharepoint.com/sites/Finance/").unwrap();
        assert_eq!(address.hostname, "contoso.sharepoint.com");
        assert_eq!(address.path, "sites/Finance");
        assert_eq!(address.graph_key(), "contoso.sharepoint.com:/sites/Finance");

        let root = SiteAddress::parse("https://contoso.sharepoint.com").unwrap();
        assert_eq!(root.graph_key(), "contoso.sharepoint.com");
    }

    #[test]
    fn test_site_address_rejects_foreign_hosts() {
        assert!(matches!(
            SiteAddress::parse("https://example.com/sites/x"),
            Err(SharePointError::InvalidSiteUrl(_))
        ));
    }

    #[test]
    fn test_drive_item_file_conversion() {
        let json = r#"{
            "id": "item-1",
            "name": "Q3: plan.docx",
            "size": 2048,
            "createdDateTime": "2024-03-01T10:00:00Z",
            "lastModifiedDateTime": "2024-03-02T11:30:00Z",
            "webUrl": "https://contoso.sharepoint.com/Shared%20Documents/plan.docx",
            "file": {"mimeType": "application/vnd.openxmlformats-officedocument.wordprocessingml.document"},
            "createdBy": {"user": {"displayName": "Ada"}},
            "@microsoft.graph.downloadUrl": "https://download.example/abc"
        }"#;
        let item: DriveItem = serde_json::from_str(json).unwrap();
        let drive = GraphDrive {
            id: "drive-1".into(),
            name: Some("Documents".into()),
            web_url: None,
        };
        let seen = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        assert!(item.is_file());
        assert_eq!(item.author(), Some("Ada"));

        let doc = item.to_descriptor(&drive, "Team/Plans", seen);
        assert_eq!(doc.safe_name, "Q3_ plan.docx");
        assert_eq!(doc.container_id, "drive-1");
        assert_eq!(doc.item_id, "item-1");
        assert_eq!(doc.library_name, "Documents");
        assert_eq!(doc.folder_path, "Team/Plans");
        assert_eq!(doc.size_bytes, 2048);
        assert_eq!(
            doc.modified_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap())
        );
        assert_eq!(
            doc.direct_download_url.as_deref(),
            Some("https://download.example/abc")
        );
        assert_eq!(doc.discovered_at, Some(seen));
    }

    #[test]
    fn test_drive_item_defaults() {
        let item: DriveItem =
            serde_json::from_str(r#"{"id":"x","file":{},"webUrl":""}"#).unwrap();
        let drive = GraphDrive {
            id: "d".into(),
            name: None,
            web_url: None,
        };

        let doc = item.to_descriptor(&drive, "", Utc::now());
        assert_eq!(doc.name, core_library::sanitize::UNKNOWN_FILE);
        assert_eq!(doc.library_name, UNKNOWN_LIBRARY);
        assert_eq!(doc.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(doc.size_bytes, 0);
        assert_eq!(doc.web_url, None);
    }

    #[test]
    fn test_page_next_link() {
        let page: Page<DriveItem> = serde_json::from_str(
            r#"{"value":[{"id":"a","folder":{"childCount":2}}],"@odata.nextLink":"https://graph.microsoft.com/v1.0/next?$skiptoken=1"}"#,
        )
        .unwrap();

        assert_eq!(page.value.len(), 1);
        assert!(page.value[0].is_folder());
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://graph.microsoft.com/v1.0/next?$skiptoken=1")
        );
    }

    #[test]
    fn test_user_email_fallback() {
        let user = GraphUser {
            id: None,
            display_name: Some("Ada".into()),
            user_principal_name: Some("ada@contoso.com".into()),
            mail: None,
        };
        assert_eq!(user.email(), Some("ada@contoso.com"));
    }
}
