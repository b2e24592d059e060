//! redstone-lib: local build service for Bukkit/Spigot plugins.
//!
//! A request describing a plugin (package, main class, Java source and
//! optional descriptor overrides) is turned into a Maven project on disk,
//! built by an external Maven process, and the produced jar is returned:
//! - `template`: default `pom.xml` / `plugin.yml` rendering
//! - `project`: project tree materialization
//! - `toolchain` / `invoke`: resolving and running Maven
//! - `artifact`: picking the primary jar from `target/`
//! - `coordinator`: the one-build-at-a-time pipeline
//! - `server`: the HTTP surface

pub mod artifact;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod decode;
pub mod invoke;
pub mod launch;
pub mod project;
pub mod request;
pub mod server;
pub mod template;
pub mod toolchain;

#[cfg(test)]
#[cfg(unix)]
pub(crate) mod testutil;
