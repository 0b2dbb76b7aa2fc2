//! Integration tests for vsdbg-layer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn vsdbg_layer(config_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("vsdbg-layer");
        cmd.env("VSDBG_CONFIG", config_dir.path().join("config.toml"));
        for var in [
            "CNB_LAYERS_DIR",
            "CNB_BUILDPACK_DIR",
            "CNB_BP_PLAN_PATH",
            "CNB_PLATFORM_DIR",
            "CNB_STACK_ID",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Visual Studio Debugger"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vsdbg-layer"));
    }

    #[test]
    fn detect_provides_vsdbg() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .arg("detect")
            .assert()
            .success()
            .stdout(predicate::str::contains("[[provides]]"))
            .stdout(predicate::str::contains("name = \"vsdbg\""));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[retrieval]"))
            .stdout(predicate::str::contains("license-mode = \"disabled\""));
    }

    #[test]
    fn config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir).args(["config", "init"]).assert().success();
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[general]\nlog-level = 3\n").unwrap();
        vsdbg_layer(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn retrieve_reports_transport_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[retrieval]\nscript-url = \"htp://not-a-scheme/getvsdbgsh\"\n",
        )
        .unwrap();
        vsdbg_layer(&dir)
            .arg("retrieve")
            .assert()
            .failure()
            .stderr(predicate::str::contains("htp://not-a-scheme/getvsdbgsh"));
    }

    #[test]
    fn retrieve_rejects_bad_platform() {
        let dir = TempDir::new().unwrap();
        vsdbg_layer(&dir)
            .args(["retrieve", "--platform", "linux"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected <os>/<arch>"));
    }
}

mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use predicates::prelude::*;
    use sha2::{Digest, Sha256};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            for sub in ["layers", "cnb", "platform"] {
                std::fs::create_dir(dir.path().join(sub)).unwrap();
            }
            Self { dir }
        }

        fn path(&self, sub: &str) -> PathBuf {
            self.dir.path().join(sub)
        }

        /// Write an archive and a catalog entry pointing at it
        fn catalog(&self, checksum_override: Option<&str>) {
            let archive = archive();
            let archive_path = self.path("vsdbg.tar.gz");
            std::fs::write(&archive_path, &archive).unwrap();

            let checksum = checksum_override
                .map(str::to_string)
                .unwrap_or_else(|| hex::encode(Sha256::digest(&archive)));
            let catalog = format!(
                r#"
[buildpack]
id = "vsdbg"

[[metadata.dependencies]]
id = "vsdbg"
name = "Visual Studio Debugger"
version = "17.4.11017+1"
checksum = "sha256:{checksum}"
uri = "file://{}"
stacks = ["*"]
"#,
                archive_path.display()
            );
            std::fs::write(self.path("cnb").join("buildpack.toml"), catalog).unwrap();

            std::fs::write(
                self.path("plan.toml"),
                "[[entries]]\nname = \"vsdbg\"\n\n[entries.metadata]\nlaunch = true\n",
            )
            .unwrap();
        }

        fn build(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("vsdbg-layer");
            cmd.env("VSDBG_CONFIG", self.path("config.toml"))
                .env_remove("CNB_STACK_ID")
                .arg("build")
                .arg("--layers")
                .arg(self.path("layers"))
                .arg("--cnb-path")
                .arg(self.path("cnb"))
                .arg("--plan")
                .arg(self.path("plan.toml"))
                .arg("--platform")
                .arg(self.path("platform"))
                .args(["--stack", "io.buildpacks.stacks.jammy"]);
            cmd
        }
    }

    fn archive() -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, body) in [("vsdbg", &b"#!/bin/sh\n"[..]), ("libvsdbg.so", &b"lib"[..])] {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn build_installs_then_reuses() {
        let ws = Workspace::new();
        ws.catalog(None);

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Installing Visual Studio Debugger 17.4.11017+1"));

        let layer = ws.path("layers").join("vsdbg");
        assert!(layer.join("vsdbg").exists());
        assert!(layer.join("libvsdbg.so").exists());
        assert_eq!(
            read(&layer.join("env").join("PATH.append")),
            layer.display().to_string()
        );
        assert_eq!(read(&layer.join("env").join("PATH.delim")), ":");

        let metadata = read(&ws.path("layers").join("vsdbg.toml"));
        assert!(metadata.contains("dependency-checksum = \"sha256:"));
        assert!(metadata.contains("launch = true"));
        for ext in ["cdx.json", "spdx.json", "syft.json"] {
            assert!(ws.path("layers").join(format!("vsdbg.sbom.{ext}")).exists());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(layer.join("vsdbg"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o110, 0o110);
            assert_eq!(mode & 0o001, 0);
        }

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"))
            .stdout(predicate::str::contains("Installing").not());
    }

    #[test]
    fn build_rejects_checksum_mismatch() {
        let ws = Workspace::new();
        ws.catalog(Some("0000"));

        ws.build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("checksum mismatch"));
        assert!(!ws.path("layers").join("vsdbg.toml").exists());
    }

    #[test]
    fn build_rejects_unknown_sbom_format() {
        let ws = Workspace::new();
        ws.catalog(None);

        ws.build()
            .args(["--sbom-format", "random-format"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported SBOM format: 'random-format'"));
    }

    #[test]
    fn build_reports_unsatisfied_constraint() {
        let ws = Workspace::new();
        ws.catalog(None);
        std::fs::write(
            ws.path("plan.toml"),
            "[[entries]]\nname = \"vsdbg\"\n\n[entries.metadata]\nversion = \"16.*\"\n",
        )
        .unwrap();

        ws.build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Supported versions are: [17.4.11017+1]"));
    }
}
