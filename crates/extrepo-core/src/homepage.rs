//! Static homepage generation.
//!
//! Combines the project's `package.json` with the generated manifest into a
//! [`RepositoryDescriptor`] and renders `bundles/index.html` from it.

use std::path::{Path, PathBuf};

use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::paths::ProjectDirs;

/// Base URL used when none can be determined.
pub const UNDEFINED_BASE_URL: &str = "undefined";

/// Fields of `package.json` the homepage uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub description: String,

    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,

    #[serde(default, rename = "noAddToPaperbackButton")]
    pub no_add_to_paperback_button: Option<bool>,

    #[serde(default, rename = "repositoryLogo")]
    pub repository_logo: Option<String>,
}

impl ProjectDescriptor {
    /// Read and validate `package.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| Error::Descriptor {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A module as listed on the homepage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceListing {
    pub name: String,
    pub tags: Vec<String>,
}

/// Everything the homepage template consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    pub repository_name: String,
    pub repository_description: String,

    #[serde(rename = "baseURL")]
    pub base_url: String,

    pub sources: Vec<SourceListing>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_logo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_add_to_paperback_button: Option<bool>,
}

impl RepositoryDescriptor {
    /// Assemble the descriptor.
    ///
    /// `github_repository` is the CI-provided `owner/repo` string.
    pub fn build(
        project: &ProjectDescriptor,
        manifest: &Manifest,
        github_repository: Option<&str>,
    ) -> Self {
        let sources = manifest
            .sources
            .iter()
            .map(|entry| SourceListing {
                name: entry.name.clone(),
                tags: entry.tags.clone(),
            })
            .collect();

        let (base_url, mut hide_button) = match resolve_base_url(project, github_repository) {
            Some(url) => (url, None),
            None => (UNDEFINED_BASE_URL.to_string(), Some(true)),
        };
        if project.no_add_to_paperback_button.is_some() {
            hide_button = project.no_add_to_paperback_button;
        }

        Self {
            repository_name: project.name.clone(),
            repository_description: project.description.clone(),
            base_url,
            sources,
            repository_logo: project.repository_logo.clone(),
            no_add_to_paperback_button: hide_button,
        }
    }

    /// Whether the "add repository" button is rendered.
    pub fn shows_add_button(&self) -> bool {
        !self.no_add_to_paperback_button.unwrap_or(false)
    }

    /// Deep link that adds this repository to the app.
    pub fn add_repository_link(&self) -> String {
        format!(
            "paperback://addRepo?displayName={}&url={}",
            encode_query_component(&self.repository_name),
            encode_query_component(&self.base_url)
        )
    }
}

/// Explicit `baseURL`, else the GitHub Pages URL of `owner/repo`.
pub fn resolve_base_url(
    project: &ProjectDescriptor,
    github_repository: Option<&str>,
) -> Option<String> {
    if let Some(url) = &project.base_url {
        return Some(url.clone());
    }

    let (owner, repo) = github_repository?.trim().split_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!(
        "https://{}.github.io/{}",
        owner.to_lowercase(),
        repo
    ))
}

fn encode_query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

const STYLE: &str = "\
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;\
margin:0;background:#f4f5f7;color:#1d1d1f}\
main{max-width:720px;margin:0 auto;padding:48px 24px}\
header{text-align:center;margin-bottom:32px}\
header img{width:96px;height:96px;border-radius:20px}\
.add{display:inline-block;margin-top:16px;padding:10px 20px;border-radius:8px;\
background:#1d1d1f;color:#fff;text-decoration:none}\
ul{list-style:none;padding:0}\
li{background:#fff;border-radius:12px;padding:16px 20px;margin-bottom:12px}\
.tag{display:inline-block;margin:6px 6px 0 0;padding:2px 8px;border-radius:6px;\
background:#e4e6eb;font-size:12px}";

/// Render the homepage.
pub fn render(repo: &RepositoryDescriptor) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (repo.repository_name) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                main {
                    header {
                        @if let Some(logo) = &repo.repository_logo {
                            img src=(logo) alt=(repo.repository_name);
                        }
                        h1 { (repo.repository_name) }
                        p { (repo.repository_description) }
                        @if repo.shows_add_button() {
                            a.add href=(repo.add_repository_link()) { "Add to Paperback" }
                        }
                    }
                    h2 { "Sources (" (repo.sources.len()) ")" }
                    ul {
                        @for source in &repo.sources {
                            li {
                                strong { (source.name) }
                                div {
                                    @for tag in &source.tags {
                                        span.tag { (tag) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Build the homepage, or `Ok(None)` when the project has no `package.json`.
pub fn generate(
    dirs: &ProjectDirs,
    manifest_path: &Path,
    github_repository: Option<&str>,
) -> Result<Option<PathBuf>> {
    if !dirs.package_file.is_file() {
        tracing::info!(
            "No {} found, skipping homepage",
            dirs.package_file.display()
        );
        return Ok(None);
    }

    let project = ProjectDescriptor::load(&dirs.package_file)?;
    let manifest = Manifest::load(manifest_path)?;
    let repo = RepositoryDescriptor::build(&project, &manifest, github_repository);

    let path = dirs.homepage_file();
    std::fs::write(&path, render(&repo).into_string())?;

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn project(base_url: Option<&str>) -> ProjectDescriptor {
        ProjectDescriptor {
            name: "Acme Extensions".to_string(),
            description: "Sources maintained by Acme".to_string(),
            base_url: base_url.map(str::to_string),
            no_add_to_paperback_button: None,
            repository_logo: None,
        }
    }

    fn manifest() -> Manifest {
        let entry = ManifestEntry {
            id: "Alpha".to_string(),
            name: "Alpha Reader".to_string(),
            author: "someone".to_string(),
            desc: String::new(),
            website: String::new(),
            version: "1.0.0".to_string(),
            icon: "icon.png".to_string(),
            tags: vec!["English".to_string()],
            website_base_url: String::new(),
        };
        Manifest::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), vec![entry])
    }

    #[test]
    fn test_no_base_url_and_no_env() {
        let repo = RepositoryDescriptor::build(&project(None), &manifest(), None);

        assert_eq!(repo.base_url, "undefined");
        assert_eq!(repo.no_add_to_paperback_button, Some(true));
        assert!(!repo.shows_add_button());
    }

    #[test]
    fn test_base_url_from_env() {
        let repo = RepositoryDescriptor::build(&project(None), &manifest(), Some("acme/repo"));

        assert_eq!(repo.base_url, "https://acme.github.io/repo");
        assert_eq!(repo.no_add_to_paperback_button, None);

        let repo = RepositoryDescriptor::build(&project(None), &manifest(), Some("Acme/Repo"));
        assert_eq!(repo.base_url, "https://acme.github.io/Repo");
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let repo = RepositoryDescriptor::build(
            &project(Some("https://custom.example")),
            &manifest(),
            Some("acme/repo"),
        );
        assert_eq!(repo.base_url, "https://custom.example");
    }

    #[test]
    fn test_malformed_env_value() {
        assert_eq!(resolve_base_url(&project(None), Some("no-slash")), None);
        assert_eq!(resolve_base_url(&project(None), Some("/repo")), None);
    }

    #[test]
    fn test_display_flags_carried() {
        let mut descriptor = project(None);
        descriptor.no_add_to_paperback_button = Some(false);
        descriptor.repository_logo = Some("https://acme.example/logo.png".to_string());

        let repo = RepositoryDescriptor::build(&descriptor, &manifest(), None);
        // Explicit flag overrides the forced one.
        assert_eq!(repo.no_add_to_paperback_button, Some(false));
        assert_eq!(
            repo.repository_logo.as_deref(),
            Some("https://acme.example/logo.png")
        );
    }

    #[test]
    fn test_template_contract() {
        let repo = RepositoryDescriptor::build(&project(None), &manifest(), Some("acme/repo"));
        let value = serde_json::to_value(&repo).unwrap();

        assert_eq!(value["repositoryName"], "Acme Extensions");
        assert_eq!(value["repositoryDescription"], "Sources maintained by Acme");
        assert_eq!(value["baseURL"], "https://acme.github.io/repo");
        assert_eq!(value["sources"][0]["name"], "Alpha Reader");
        assert_eq!(value["sources"][0]["tags"][0], "English");
        assert!(value.get("repositoryLogo").is_none());
    }

    #[test]
    fn test_render() {
        let repo = RepositoryDescriptor::build(&project(None), &manifest(), Some("acme/repo"));
        let page = render(&repo).into_string();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Acme Extensions</title>"));
        assert!(page.contains("Alpha Reader"));
        assert!(page.contains(
            "paperback://addRepo?displayName=Acme%20Extensions&amp;url=https%3A%2F%2Facme.github.io%2Frepo"
        ));
        assert_eq!(page, render(&repo).into_string());

        let hidden = RepositoryDescriptor::build(&project(None), &manifest(), None);
        assert!(!render(&hidden).into_string().contains("paperback://"));
    }

    #[test]
    fn test_generate_skips_without_package_json() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());

        let result = generate(&dirs, &dirs.manifest_file(), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_generate_requires_manifest() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());
        std::fs::write(
            &dirs.package_file,
            r#"{"name": "acme", "description": "d"}"#,
        )
        .unwrap();

        let err = generate(&dirs, &dirs.manifest_file(), None).unwrap_err();
        assert!(matches!(err, Error::Descriptor { .. }));
    }

    #[test]
    fn test_generate_writes_page() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());
        std::fs::create_dir_all(&dirs.bundles_dir).unwrap();
        std::fs::write(
            &dirs.package_file,
            r#"{"name": "acme", "description": "d", "baseURL": "https://custom.example", "version": "1.0.0"}"#,
        )
        .unwrap();
        manifest().write(dirs.manifest_file()).unwrap();

        let path = generate(&dirs, &dirs.manifest_file(), None).unwrap().unwrap();
        let page = std::fs::read_to_string(path).unwrap();
        assert!(page.contains("https%3A%2F%2Fcustom.example"));
    }
}
