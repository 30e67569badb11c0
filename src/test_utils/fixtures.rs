//! Test fixtures for projects, manifests and installed packages

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sample project manifest content
#[derive(Clone, Debug)]
pub struct ManifestFixture {
    pub content: String,
    pub name: String,
}

impl ManifestFixture {
    /// Tool project with a single `<Version>` element
    pub fn tool(version: &str) -> Self {
        Self {
            name: "tool".to_string(),
            content: format!(
                r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFramework>net8.0</TargetFramework>
    <PackAsTool>true</PackAsTool>
    <ToolCommandName>wrapkit</ToolCommandName>
    <Version>{version}</Version>
  </PropertyGroup>
</Project>
"#
            ),
        }
    }

    /// Same project saved with Windows line endings
    pub fn tool_crlf(version: &str) -> Self {
        let mut fixture = Self::tool(version);
        fixture.name = "tool_crlf".to_string();
        fixture.content = fixture.content.replace('\n', "\r\n");
        fixture
    }

    /// Project without any version element
    pub fn unversioned() -> Self {
        Self {
            name: "unversioned".to_string(),
            content: "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup />\n</Project>\n"
                .to_string(),
        }
    }

    /// Write the manifest into `dir` as `Wrapkit.csproj`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("Wrapkit.csproj");
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write manifest fixture {}", self.name))?;
        Ok(path)
    }
}

/// Temporary layout with a project, an installed tool store and a config file.
///
/// ```text
/// <temp>/
/// ├── home/
/// ├── project/Wrapkit.csproj
/// ├── tools/.store/wrapkit/   (installed packages)
/// └── config.toml
/// ```
pub struct ProjectFixture {
    temp: TempDir,
}

impl ProjectFixture {
    pub fn new(version: &str) -> Result<Self> {
        Self::with_manifest(&ManifestFixture::tool(version))
    }

    pub fn with_manifest(manifest: &ManifestFixture) -> Result<Self> {
        let temp = TempDir::new()?;
        let fixture = Self {
            temp,
        };
        fs::create_dir_all(fixture.project_dir())?;
        fs::create_dir_all(fixture.installed_root())?;
        fs::create_dir_all(fixture.home_dir())?;
        manifest.write_to(&fixture.project_dir())?;
        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn home_dir(&self) -> PathBuf {
        self.root().join("home")
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir().join("Wrapkit.csproj")
    }

    pub fn installed_root(&self) -> PathBuf {
        self.root().join("tools")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn manifest_content(&self) -> Result<String> {
        fs::read_to_string(self.manifest_path()).context("Failed to read fixture manifest")
    }

    /// Place an installed package with the given content in the tool store
    pub fn install_package(&self, version: &str, content: &[u8]) -> Result<PathBuf> {
        let dir = self.installed_root().join(".store").join("wrapkit").join(version);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("Wrapkit.{version}.nupkg"));
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a config file pointing at this fixture, with extra TOML appended
    pub fn write_config(&self, extra: &str) -> Result<PathBuf> {
        let content = format!(
            "[project]\nproject_dir = {:?}\nsearch_home = false\n\n[install]\ninstalled_root = {:?}\n\n[shell]\nintegration = false\n\n{extra}",
            self.project_dir().display().to_string(),
            self.installed_root().display().to_string(),
        );
        let path = self.config_path();
        fs::write(&path, content)?;
        Ok(path)
    }
}
