//! The build request accepted by `POST /api/build`.

use serde::Deserialize;

/// A plugin source description submitted by the UI.
///
/// Missing fields decode to empty strings. The plugin name is used both as a
/// directory component and (lower-cased) as an artifact coordinate; it is not
/// validated here. An empty name makes the project directory the workspace
/// root itself, and a name containing separators or `..` escapes it, so
/// callers exposed to untrusted input must sanitize it first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildRequest {
  pub plugin_name: String,
  pub package_name: String,
  pub main_class: String,
  pub full_main: String,
  pub version: String,
  pub author: String,
  pub website: String,
  pub group_id: String,
  pub artifact_id: String,
  pub java_code: String,
  /// Raw `plugin.yml` override.
  pub plugin_yml: String,
  /// Raw `config.yml` override. There is no default for this file.
  pub config_yml: String,
  /// Raw `pom.xml` override.
  pub pom_xml: String,
}

impl BuildRequest {
  pub fn pom_override(&self) -> Option<&str> {
    non_empty(&self.pom_xml)
  }

  pub fn plugin_yml_override(&self) -> Option<&str> {
    non_empty(&self.plugin_yml)
  }

  pub fn config_yml_override(&self) -> Option<&str> {
    non_empty(&self.config_yml)
  }

  /// Fully qualified main class, `<package>.<mainClass>`.
  pub fn qualified_main(&self) -> String {
    format!("{}.{}", self.package_name, self.main_class)
  }
}

fn non_empty(s: &str) -> Option<&str> {
  if s.is_empty() { None } else { Some(s) }
}
