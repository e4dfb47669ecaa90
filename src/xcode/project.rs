//! The Pods Xcode project.
//!
//! [`PbxProject`] gives typed access to the parts of `project.pbxproj` that
//! Apollon reads and rewrites: targets, their compile-sources phases, script
//! phases, dependencies and the main group.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{BuildFile, ProjectStore};
use crate::util::fs::{read_to_string, write_atomic};
use crate::util::hash::Fingerprint;
use crate::xcode::pbxproj::{self, PbxDict, PbxValue};

/// File name of the project document inside an `.xcodeproj` bundle.
pub const PBXPROJ: &str = "project.pbxproj";

const SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
const SHELL_SCRIPT_PHASE: &str = "PBXShellScriptBuildPhase";
const BUILD_FILE: &str = "PBXBuildFile";
const COMPILER_FLAGS: &str = "COMPILER_FLAGS";

fn dict(entries: Vec<(&str, PbxValue)>) -> PbxDict {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// An Xcode project opened from an `.xcodeproj` bundle.
#[derive(Debug, Clone)]
pub struct PbxProject {
    path: PathBuf,
    root: PbxDict,
}

impl PbxProject {
    /// Open `<path>/project.pbxproj`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = path.join(PBXPROJ);
        let contents = read_to_string(&file)?;
        Self::parse(path, &contents).with_context(|| format!("failed to load {}", file.display()))
    }

    /// Build a project from pbxproj contents, as if opened from `path`.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let root = pbxproj::parse(contents)?;
        let project = PbxProject {
            path: path.to_path_buf(),
            root,
        };
        if project.objects().is_none() {
            bail!("project has no objects");
        }
        if project.root_object().is_none() {
            bail!("project has no root object");
        }
        Ok(project)
    }

    /// The `.xcodeproj` bundle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the `.xcodeproj` bundle.
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Serialized project document.
    pub fn to_pbxproj(&self) -> String {
        pbxproj::write(&self.root)
    }

    fn objects(&self) -> Option<&PbxDict> {
        self.root.get("objects").and_then(PbxValue::as_dict)
    }

    fn objects_mut(&mut self) -> Result<&mut PbxDict> {
        self.root
            .get_mut("objects")
            .and_then(PbxValue::as_dict_mut)
            .context("project has no objects")
    }

    /// Look up an object by id.
    pub fn object(&self, id: &str) -> Option<&PbxDict> {
        self.objects()?.get(id)?.as_dict()
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut PbxDict> {
        self.objects_mut()?
            .get_mut(id)
            .and_then(PbxValue::as_dict_mut)
            .with_context(|| format!("object {} not found in project", id))
    }

    fn field(&self, id: &str, key: &str) -> Option<&str> {
        self.object(id)?.get(key)?.as_str()
    }

    fn isa(&self, id: &str) -> Option<&str> {
        self.field(id, "isa")
    }

    /// String entries of an array field, usually object ids.
    fn id_list(&self, id: &str, key: &str) -> Vec<String> {
        self.object(id)
            .and_then(|object| object.get(key))
            .and_then(PbxValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(PbxValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_field(&mut self, id: &str, key: &str, value: PbxValue) -> Result<()> {
        self.object_mut(id)?.insert(key.to_string(), value);
        Ok(())
    }

    fn push_id(&mut self, id: &str, key: &str, value: &str) -> Result<()> {
        let object = self.object_mut(id)?;
        let list = object
            .entry(key.to_string())
            .or_insert_with(|| PbxValue::Array(Vec::new()));
        match list.as_array_mut() {
            Some(items) => {
                items.push(PbxValue::string(value));
                Ok(())
            }
            None => bail!("`{}` of object {} is not an array", key, id),
        }
    }

    fn remove_id(&mut self, id: &str, key: &str, value: &str) -> Result<bool> {
        let object = self.object_mut(id)?;
        let Some(items) = object.get_mut(key).and_then(PbxValue::as_array_mut) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|item| item.as_str() != Some(value));
        Ok(items.len() != before)
    }

    fn insert_object(&mut self, id: &str, object: PbxDict) -> Result<()> {
        self.objects_mut()?
            .insert(id.to_string(), PbxValue::Dict(object));
        Ok(())
    }

    fn remove_object(&mut self, id: &str) -> Result<()> {
        self.objects_mut()?.shift_remove(id);
        Ok(())
    }

    /// A fresh object id derived from `seed`.
    fn generate_id(&self, seed: &str) -> String {
        let mut attempt = 0u64;
        loop {
            let mut fingerprint = Fingerprint::new();
            fingerprint.update_str(seed).update_u64(attempt);
            let id = fingerprint.finish_object_id();
            if self.object(&id).is_none() {
                return id;
            }
            attempt += 1;
        }
    }

    fn root_object_id(&self) -> Option<&str> {
        self.root.get("rootObject")?.as_str()
    }

    fn root_object(&self) -> Option<&PbxDict> {
        self.object(self.root_object_id()?)
    }

    fn root_id(&self) -> Result<String> {
        self.root_object_id()
            .map(str::to_string)
            .context("project has no root object")
    }

    /// Ids of all targets, in project order.
    pub fn target_ids(&self) -> Vec<String> {
        match self.root_object_id() {
            Some(root) => self.id_list(root, "targets"),
            None => Vec::new(),
        }
    }

    /// Id of the target called `name`.
    pub fn target_id(&self, name: &str) -> Option<String> {
        self.target_ids()
            .into_iter()
            .find(|id| self.target_name(id) == Some(name))
    }

    pub fn target_name(&self, id: &str) -> Option<&str> {
        self.field(id, "name")
    }

    fn build_phase(&self, target_id: &str, isa: &str, name: Option<&str>) -> Option<String> {
        self.id_list(target_id, "buildPhases")
            .into_iter()
            .find(|phase| {
                self.isa(phase) == Some(isa)
                    && name.map_or(true, |name| self.field(phase, "name") == Some(name))
            })
    }

    fn sources_phase(&self, target: &str) -> Option<String> {
        let target_id = self.target_id(target)?;
        self.build_phase(&target_id, SOURCES_PHASE, None)
    }

    /// Names of the project-level build configurations.
    pub fn configuration_names(&self) -> Vec<String> {
        let Some(list) = self
            .root_object()
            .and_then(|root| root.get("buildConfigurationList"))
            .and_then(PbxValue::as_str)
        else {
            return Vec::new();
        };
        self.id_list(list, "buildConfigurations")
            .iter()
            .filter_map(|config| self.field(config, "name"))
            .map(str::to_string)
            .collect()
    }

    /// Add an aggregate target with one build configuration per project
    /// configuration. Returns the id of the existing target if there is one.
    pub fn add_aggregate_target(&mut self, name: &str) -> Result<String> {
        if let Some(id) = self.target_id(name) {
            return Ok(id);
        }

        let names = self.configuration_names();
        let mut configs = Vec::new();
        for config in &names {
            let id = self.generate_id(&format!("{}:XCBuildConfiguration:{}", name, config));
            let settings = dict(vec![("PRODUCT_NAME", PbxValue::string("$(TARGET_NAME)"))]);
            self.insert_object(
                &id,
                dict(vec![
                    ("isa", "XCBuildConfiguration".into()),
                    ("buildSettings", settings.into()),
                    ("name", config.as_str().into()),
                ]),
            )?;
            configs.push(id);
        }

        let default_config = if names.iter().any(|n| n == "Release") {
            "Release".to_string()
        } else {
            names.first().cloned().unwrap_or_default()
        };
        let list_id = self.generate_id(&format!("{}:XCConfigurationList", name));
        self.insert_object(
            &list_id,
            dict(vec![
                ("isa", "XCConfigurationList".into()),
                ("buildConfigurations", PbxValue::strings(configs)),
                ("defaultConfigurationIsVisible", "0".into()),
                ("defaultConfigurationName", default_config.into()),
            ]),
        )?;

        let target_id = self.generate_id(&format!("{}:PBXAggregateTarget", name));
        self.insert_object(
            &target_id,
            dict(vec![
                ("isa", "PBXAggregateTarget".into()),
                ("buildConfigurationList", list_id.into()),
                ("buildPhases", PbxValue::Array(Vec::new())),
                ("dependencies", PbxValue::Array(Vec::new())),
                ("name", name.into()),
                ("productName", name.into()),
            ]),
        )?;
        let root = self.root_id()?;
        self.push_id(&root, "targets", &target_id)?;
        Ok(target_id)
    }

    /// Id of the shell-script phase called `name` on a target.
    pub fn shell_script_phase(&self, target_id: &str, name: &str) -> Option<String> {
        self.build_phase(target_id, SHELL_SCRIPT_PHASE, Some(name))
    }

    /// Append a shell-script phase to a target. A phase of the same name is
    /// reused.
    pub fn add_shell_script_phase(
        &mut self,
        target_id: &str,
        name: &str,
        script: &str,
    ) -> Result<String> {
        if let Some(id) = self.shell_script_phase(target_id, name) {
            self.set_field(&id, "shellScript", script.into())?;
            return Ok(id);
        }

        let id = self.generate_id(&format!("{}:{}:{}", target_id, SHELL_SCRIPT_PHASE, name));
        self.insert_object(
            &id,
            dict(vec![
                ("isa", SHELL_SCRIPT_PHASE.into()),
                ("buildActionMask", "2147483647".into()),
                ("files", PbxValue::Array(Vec::new())),
                ("inputPaths", PbxValue::Array(Vec::new())),
                ("name", name.into()),
                ("outputPaths", PbxValue::Array(Vec::new())),
                ("runOnlyForDeploymentPostprocessing", "0".into()),
                ("shellPath", "/bin/sh".into()),
                ("shellScript", script.into()),
                ("showEnvVarsInLog", "0".into()),
            ]),
        )?;
        self.push_id(target_id, "buildPhases", &id)?;
        Ok(id)
    }

    /// Remove the shell-script phase called `name` from a target.
    pub fn remove_shell_script_phase(&mut self, target_id: &str, name: &str) -> Result<bool> {
        let Some(id) = self.shell_script_phase(target_id, name) else {
            return Ok(false);
        };
        self.remove_id(target_id, "buildPhases", &id)?;
        self.remove_object(&id)?;
        Ok(true)
    }

    /// The dependency object through which `target_id` depends on
    /// `dependency_id`.
    pub fn dependency_on(&self, target_id: &str, dependency_id: &str) -> Option<String> {
        self.id_list(target_id, "dependencies")
            .into_iter()
            .find(|dep| self.field(dep, "target") == Some(dependency_id))
    }

    /// Make `target_id` depend on `dependency_id`. Returns false if the
    /// dependency already exists.
    pub fn add_dependency(&mut self, target_id: &str, dependency_id: &str) -> Result<bool> {
        if self.dependency_on(target_id, dependency_id).is_some() {
            return Ok(false);
        }

        let name = self
            .target_name(dependency_id)
            .with_context(|| format!("target {} not found in project", dependency_id))?
            .to_string();
        let root = self.root_id()?;

        let proxy_id = self.generate_id(&format!("{}:PBXContainerItemProxy:{}", target_id, dependency_id));
        self.insert_object(
            &proxy_id,
            dict(vec![
                ("isa", "PBXContainerItemProxy".into()),
                ("containerPortal", root.into()),
                ("proxyType", "1".into()),
                ("remoteGlobalIDString", dependency_id.into()),
                ("remoteInfo", name.as_str().into()),
            ]),
        )?;

        let dep_id = self.generate_id(&format!("{}:PBXTargetDependency:{}", target_id, dependency_id));
        self.insert_object(
            &dep_id,
            dict(vec![
                ("isa", "PBXTargetDependency".into()),
                ("name", name.into()),
                ("target", dependency_id.into()),
                ("targetProxy", proxy_id.into()),
            ]),
        )?;
        self.push_id(target_id, "dependencies", &dep_id)?;
        Ok(true)
    }

    fn remove_dependency_object(&mut self, dep_id: &str) -> Result<()> {
        if let Some(proxy) = self.field(dep_id, "targetProxy").map(str::to_string) {
            self.remove_object(&proxy)?;
        }
        self.remove_object(dep_id)
    }

    /// Remove every dependency on `dependency_id`. Returns how many were
    /// removed.
    pub fn remove_dependencies_on(&mut self, dependency_id: &str) -> Result<usize> {
        let mut removed = 0;
        for target_id in self.target_ids() {
            while let Some(dep) = self.dependency_on(&target_id, dependency_id) {
                self.remove_id(&target_id, "dependencies", &dep)?;
                self.remove_dependency_object(&dep)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove a target together with its configurations, phases and
    /// dependencies.
    pub fn remove_target(&mut self, target_id: &str) -> Result<()> {
        if let Some(list) = self.field(target_id, "buildConfigurationList").map(str::to_string) {
            for config in self.id_list(&list, "buildConfigurations") {
                self.remove_object(&config)?;
            }
            self.remove_object(&list)?;
        }
        for phase in self.id_list(target_id, "buildPhases") {
            for build_file in self.id_list(&phase, "files") {
                self.remove_object(&build_file)?;
            }
            self.remove_object(&phase)?;
        }
        for dep in self.id_list(target_id, "dependencies") {
            self.remove_dependency_object(&dep)?;
        }
        if let Some(product) = self.field(target_id, "productReference").map(str::to_string) {
            self.remove_from_groups(&product)?;
            self.remove_object(&product)?;
        }

        let root = self.root_id()?;
        self.remove_id(&root, "targets", target_id)?;
        self.remove_object(target_id)
    }

    fn remove_from_groups(&mut self, child: &str) -> Result<()> {
        let groups: Vec<String> = self
            .objects()
            .map(|objects| {
                objects
                    .keys()
                    .filter(|id| self.isa(id) == Some("PBXGroup"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for group in groups {
            self.remove_id(&group, "children", child)?;
        }
        Ok(())
    }

    fn main_group(&self) -> Option<String> {
        self.root_object()?
            .get("mainGroup")?
            .as_str()
            .map(str::to_string)
    }

    /// File reference in the main group whose name or path is `name`.
    pub fn main_group_file(&self, name: &str) -> Option<String> {
        let group = self.main_group()?;
        self.id_list(&group, "children").into_iter().find(|child| {
            self.isa(child) == Some("PBXFileReference")
                && (self.field(child, "name") == Some(name) || self.field(child, "path") == Some(name))
        })
    }

    /// Reference a file next to the project from the main group.
    pub fn add_file_to_main_group(&mut self, path: &str, file_type: &str) -> Result<String> {
        if let Some(id) = self.main_group_file(path) {
            return Ok(id);
        }
        let group = self.main_group().context("project has no main group")?;
        let id = self.generate_id(&format!("PBXFileReference:{}", path));
        self.insert_object(
            &id,
            dict(vec![
                ("isa", "PBXFileReference".into()),
                ("explicitFileType", file_type.into()),
                ("includeInIndex", "1".into()),
                ("path", path.into()),
                ("sourceTree", "<group>".into()),
            ]),
        )?;
        self.push_id(&group, "children", &id)?;
        Ok(id)
    }

    /// Drop the main-group file reference called `name`.
    pub fn remove_file_from_main_group(&mut self, name: &str) -> Result<bool> {
        let Some(id) = self.main_group_file(name) else {
            return Ok(false);
        };
        self.remove_from_groups(&id)?;
        self.remove_object(&id)?;
        Ok(true)
    }
}

impl ProjectStore for PbxProject {
    fn targets(&self) -> Vec<String> {
        self.target_ids()
            .iter()
            .filter_map(|id| self.target_name(id))
            .map(str::to_string)
            .collect()
    }

    fn compile_sources(&self, target: &str) -> Option<Vec<BuildFile>> {
        let phase = self.sources_phase(target)?;
        let files = self
            .id_list(&phase, "files")
            .iter()
            .filter_map(|id| self.object(id))
            .filter_map(|build_file| {
                let file_ref = build_file.get("fileRef")?.as_str()?;
                let flags = build_file
                    .get("settings")
                    .and_then(PbxValue::as_dict)
                    .and_then(|settings| settings.get(COMPILER_FLAGS))
                    .and_then(PbxValue::as_str);
                Some(BuildFile {
                    file_ref: file_ref.to_string(),
                    compiler_flags: flags.map(str::to_string),
                })
            })
            .collect();
        Some(files)
    }

    fn set_compile_sources(&mut self, target: &str, files: &[BuildFile]) -> Result<()> {
        if self.target_id(target).is_none() {
            bail!("target `{}` not found in {}", target, self.path.display());
        }
        let Some(phase) = self.sources_phase(target) else {
            bail!("target `{}` has no compile sources phase", target);
        };

        for old in self.id_list(&phase, "files") {
            self.remove_object(&old)?;
        }

        let mut ids = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let id = self.generate_id(&format!("{}:{}:{}:{}", BUILD_FILE, target, file.file_ref, index));
            let mut object = dict(vec![
                ("isa", BUILD_FILE.into()),
                ("fileRef", file.file_ref.as_str().into()),
            ]);
            if let Some(flags) = &file.compiler_flags {
                object.insert(
                    "settings".to_string(),
                    dict(vec![(COMPILER_FLAGS, flags.as_str().into())]).into(),
                );
            }
            self.insert_object(&id, object)?;
            ids.push(id);
        }
        self.set_field(&phase, "files", PbxValue::strings(ids))
    }

    fn save(&mut self) -> Result<()> {
        let file = self.path.join(PBXPROJ);
        tracing::debug!("writing {}", file.display());
        write_atomic(&file, self.to_pbxproj().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = include_str!("../../tests/fixtures/project.pbxproj");

    fn sample() -> PbxProject {
        PbxProject::parse(Path::new("/app/Pods/Pods.xcodeproj"), SAMPLE).unwrap()
    }

    #[test]
    fn test_targets_and_sources() {
        let project = sample();
        assert_eq!(project.targets(), vec!["AFNetworking", "MyKit", "Pods-App"]);
        assert_eq!(project.project_dir(), Path::new("/app/Pods"));

        let sources = project.compile_sources("AFNetworking").unwrap();
        assert_eq!(
            sources,
            vec![
                BuildFile::new("6A1F0C2B9D4E7F3000000020"),
                BuildFile::with_flags("6A1F0C2B9D4E7F3000000021", "-DOS_OBJECT_USE_OBJC=0 -w"),
            ]
        );
        assert!(project.compile_sources("Missing").is_none());
        assert_eq!(project.configuration_names(), vec!["Debug", "Release"]);
    }

    #[test]
    fn test_clear_and_restore_sources() {
        let mut project = sample();
        let original = project.compile_sources("AFNetworking").unwrap();

        project.set_compile_sources("AFNetworking", &[]).unwrap();
        assert!(project.compile_sources("AFNetworking").unwrap().is_empty());
        assert!(project.object("6A1F0C2B9D4E7F3000000031").is_none());

        project.set_compile_sources("AFNetworking", &original).unwrap();
        assert_eq!(project.compile_sources("AFNetworking").unwrap(), original);

        assert!(project.set_compile_sources("Missing", &[]).is_err());
    }

    #[test]
    fn test_save_and_reopen() {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("Pods.xcodeproj");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join(PBXPROJ), SAMPLE).unwrap();

        let mut project = PbxProject::open(&bundle).unwrap();
        project.set_compile_sources("MyKit", &[]).unwrap();
        project.save().unwrap();

        let reopened = PbxProject::open(&bundle).unwrap();
        assert!(reopened.compile_sources("MyKit").unwrap().is_empty());
        assert_eq!(reopened.compile_sources("AFNetworking").unwrap().len(), 2);
    }

    #[test]
    fn test_aggregate_target_with_script_and_dependency() {
        let mut project = sample();
        let apollon = project.add_aggregate_target("Apollon").unwrap();
        assert_eq!(project.add_aggregate_target("Apollon").unwrap(), apollon);
        assert_eq!(project.isa(&apollon), Some("PBXAggregateTarget"));
        assert!(project.compile_sources("Apollon").is_none());

        let phase = project
            .add_shell_script_phase(&apollon, "[Apollon] Sync", "apollon --cache\n")
            .unwrap();
        assert_eq!(project.shell_script_phase(&apollon, "[Apollon] Sync"), Some(phase));

        let kit = project.target_id("MyKit").unwrap();
        assert!(project.add_dependency(&kit, &apollon).unwrap());
        assert!(!project.add_dependency(&kit, &apollon).unwrap());
        let dep = project.dependency_on(&kit, &apollon).unwrap();
        let proxy = project.field(&dep, "targetProxy").unwrap().to_string();
        assert_eq!(project.field(&proxy, "remoteInfo"), Some("Apollon"));

        // survives a write/parse cycle
        let reparsed = PbxProject::parse(project.path(), &project.to_pbxproj()).unwrap();
        assert_eq!(reparsed.targets().last().map(String::as_str), Some("Apollon"));
        assert!(reparsed.dependency_on(&kit, &apollon).is_some());
    }

    #[test]
    fn test_remove_aggregate_target() {
        let mut project = sample();
        let objects_before = project.objects().unwrap().len();

        let apollon = project.add_aggregate_target("Apollon").unwrap();
        project
            .add_shell_script_phase(&apollon, "[Apollon] Sync", "apollon --cache\n")
            .unwrap();
        for target in project.target_ids() {
            if target != apollon {
                project.add_dependency(&target, &apollon).unwrap();
            }
        }

        assert_eq!(project.remove_dependencies_on(&apollon).unwrap(), 3);
        project.remove_target(&apollon).unwrap();

        assert!(project.target_id("Apollon").is_none());
        assert_eq!(project.objects().unwrap().len(), objects_before);
    }

    #[test]
    fn test_main_group_file() {
        let mut project = sample();
        let id = project
            .add_file_to_main_group("Apollonfile", "text.plist.xml")
            .unwrap();
        assert_eq!(project.main_group_file("Apollonfile"), Some(id.clone()));
        assert_eq!(
            project
                .add_file_to_main_group("Apollonfile", "text.plist.xml")
                .unwrap(),
            id
        );

        assert!(project.remove_file_from_main_group("Apollonfile").unwrap());
        assert!(project.object(&id).is_none());
        assert!(!project.remove_file_from_main_group("Apollonfile").unwrap());
    }
}
