//! Default descriptor rendering.
//!
//! Pure string templating: request fields are substituted into fixed
//! templates. Only used when the caller did not supply an override.

mod templates;

use crate::request::BuildRequest;

pub use templates::{PLUGIN_YML_TEMPLATE, POM_XML_TEMPLATE};

/// The descriptor files that have a default rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
  /// The build manifest (`pom.xml`).
  Manifest,
  /// The plugin metadata file (`plugin.yml`).
  PluginMetadata,
}

/// Render the default text for a descriptor.
///
/// `groupId` falls back to the package name and `artifactId` to the
/// lower-cased plugin name.
pub fn render_descriptor(kind: DescriptorKind, request: &BuildRequest) -> String {
  let main = request.qualified_main();

  match kind {
    DescriptorKind::Manifest => {
      let group_id = if request.group_id.is_empty() {
        request.package_name.clone()
      } else {
        request.group_id.clone()
      };
      let artifact_id = if request.artifact_id.is_empty() {
        request.plugin_name.to_lowercase()
      } else {
        request.artifact_id.clone()
      };

      substitute(
        POM_XML_TEMPLATE,
        &[
          ("group_id", group_id.as_str()),
          ("artifact_id", artifact_id.as_str()),
          ("version", request.version.as_str()),
          ("main", main.as_str()),
          ("plugin_name", request.plugin_name.as_str()),
        ],
      )
    }
    DescriptorKind::PluginMetadata => substitute(
      PLUGIN_YML_TEMPLATE,
      &[
        ("plugin_name", request.plugin_name.as_str()),
        ("version", request.version.as_str()),
        ("main", main.as_str()),
        ("author", request.author.as_str()),
        ("website", request.website.as_str()),
      ],
    ),
  }
}

/// Replace `{key}` placeholders in one pass, so substituted values are never
/// rescanned. Unknown placeholders are kept verbatim.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(template.len() + 128);
  let mut rest = template;

  while let Some(start) = rest.find('{') {
    out.push_str(&rest[..start]);
    let after = &rest[start + 1..];

    let replaced = after.find('}').and_then(|end| {
      let key = &after[..end];
      vars
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| (*value, end))
    });

    match replaced {
      Some((value, end)) => {
        out.push_str(value);
        rest = &after[end + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }

  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_request() -> BuildRequest {
    BuildRequest {
      plugin_name: "HelloWorld".to_string(),
      package_name: "com.example.hello".to_string(),
      main_class: "Main".to_string(),
      version: "1.2.3".to_string(),
      author: "Steve".to_string(),
      website: "https://example.com".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn manifest_contains_request_fields() {
    let pom = render_descriptor(DescriptorKind::Manifest, &sample_request());

    assert!(pom.contains("<groupId>com.example.hello</groupId>"));
    assert!(pom.contains("<version>1.2.3</version>"));
    assert!(pom.contains("<Main-Class>com.example.hello.Main</Main-Class>"));
    assert!(pom.contains("<finalName>HelloWorld</finalName>"));
  }

  #[test]
  fn manifest_defaults_artifact_id_to_lowercase_name() {
    let pom = render_descriptor(DescriptorKind::Manifest, &sample_request());

    assert!(pom.contains("<artifactId>helloworld</artifactId>"));
  }

  #[test]
  fn manifest_uses_explicit_coordinates() {
    let req = BuildRequest {
      group_id: "org.custom".to_string(),
      artifact_id: "custom-plugin".to_string(),
      ..sample_request()
    };

    let pom = render_descriptor(DescriptorKind::Manifest, &req);

    assert!(pom.contains("<groupId>org.custom</groupId>"));
    assert!(pom.contains("<artifactId>custom-plugin</artifactId>"));
    assert!(!pom.contains("<groupId>com.example.hello</groupId>"));
  }

  #[test]
  fn plugin_metadata_lists_fields() {
    let yml = render_descriptor(DescriptorKind::PluginMetadata, &sample_request());

    assert_eq!(
      yml,
      "name: HelloWorld\n\
       version: 1.2.3\n\
       main: com.example.hello.Main\n\
       author: Steve\n\
       website: https://example.com\n\
       api-version: 1.20"
    );
  }

  #[test]
  fn rendering_is_deterministic() {
    let req = sample_request();
    assert_eq!(
      render_descriptor(DescriptorKind::Manifest, &req),
      render_descriptor(DescriptorKind::Manifest, &req)
    );
  }

  #[test]
  fn substituted_values_are_not_rescanned() {
    let out = substitute("{a}-{b}", &[("a", "{b}"), ("b", "x")]);
    assert_eq!(out, "{b}-x");
  }

  #[test]
  fn unknown_placeholders_are_kept() {
    let out = substitute("{a} {missing} {", &[("a", "1")]);
    assert_eq!(out, "1 {missing} {");
  }

  #[test]
  fn no_placeholders_left_in_rendered_templates() {
    let req = sample_request();
    for kind in [DescriptorKind::Manifest, DescriptorKind::PluginMetadata] {
      let text = render_descriptor(kind, &req);
      assert!(!text.contains("{plugin_name}"));
      assert!(!text.contains("{version}"));
      assert!(!text.contains("{main}"));
    }
  }
}
