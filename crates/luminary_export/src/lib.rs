//! # luminary_export
//!
//! Builds spawn data from an editor [`Project`](luminary_project::Project)
//! and writes it out as assembly text for the target.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`ResolveContext`] resolves each declared parameter through the
//!    instance, prefab child, archetype and type override levels.
//! 2. [`Assembler`] groups resolved parameters into entity and component
//!    spawn data and attaches script routines.
//! 3. The exporters serialise the results. Scene and prefab exporters share
//!    identical spawn records through a [`SpawnDataRegistry`] scoped to the
//!    single export call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luminary_export::{Assembler, ExportConfig, write_scene};
//! use luminary_project::Project;
//! use luminary_types::ScriptAddressMap;
//!
//! let project = Project::load_file("project.json".as_ref()).unwrap();
//! let config = ExportConfig::new("out");
//! let addresses = ScriptAddressMap::new();
//! let assembler = Assembler::new(&project, &addresses, &config);
//!
//! for scene in &project.scenes {
//!     let entities = assembler.convert_scene(scene).unwrap();
//!     write_scene(&scene.name, &entities, &config).unwrap();
//! }
//! ```

pub mod archetype;
pub mod assembler;
pub mod config;
pub mod dedup;
pub mod error;
pub mod prefab;
pub mod resolver;
pub mod scene;
pub mod writer;

pub use archetype::{ARCHETYPES_FILE, export_archetypes, write_archetypes};
pub use assembler::{Assembler, create_prefab_type};
pub use config::ExportConfig;
pub use dedup::{Registration, SpawnDataRegistry};
pub use error::ExportError;
pub use prefab::{PREFABS_FILE, export_prefabs, write_prefabs};
pub use resolver::ResolveContext;
pub use scene::{export_scene, scene_file_name, write_scene};
