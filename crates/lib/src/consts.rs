//! Fixed names shared across the crate.

pub const APP_NAME: &str = "redstone";

/// Arguments passed to the build tool: a clean, test-skipping, quiet package build.
pub const BUILD_TOOL_ARGS: &[&str] = &["clean", "package", "-DskipTests", "-q"];

/// Environment variable pointing the build tool at its home directory.
pub const BUILD_TOOL_HOME_VAR: &str = "MAVEN_HOME";

pub const MANIFEST_FILE: &str = "pom.xml";
pub const PLUGIN_METADATA_FILE: &str = "plugin.yml";
pub const SECONDARY_CONFIG_FILE: &str = "config.yml";

pub const SOURCE_ROOT: &str = "src/main/java";
pub const RESOURCE_ROOT: &str = "src/main/resources";
pub const SOURCE_EXT: &str = "java";

/// Build output subdirectory scanned for the produced archive.
pub const OUTPUT_DIR: &str = "target";
pub const ARTIFACT_EXT: &str = "jar";
pub const ARTIFACT_CONTENT_TYPE: &str = "application/java-archive";

/// Filename markers of auxiliary archives emitted alongside the primary one.
pub const AUXILIARY_MARKERS: &[&str] = &["sources", "original"];
