use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway data directory plus a config file pointing at it.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let env = Self { temp_dir };
        for dir in ["images", "audio", "videos", "temp", "bin"] {
            fs::create_dir_all(env.data_dir().join(dir))?;
        }
        env.write_config("ffmpeg", "ffprobe")?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn write_config(&self, ffmpeg: &str, ffprobe: &str) -> Result<()> {
        let config = format!(
            "data_dir = {:?}\nffmpeg = {:?}\nffprobe = {:?}\nencode_timeout_secs = 30\n",
            self.data_dir().display().to_string(),
            ffmpeg,
            ffprobe,
        );
        fs::write(self.config_path(), config)?;
        Ok(())
    }

    /// Replace the encoder and prober with shell stubs.
    #[cfg(unix)]
    pub fn install_stub_tools(&self, encoder_succeeds: bool) -> Result<()> {
        let ffprobe = self.write_script("ffprobe", "#!/bin/sh\necho 9.0\n")?;
        let ffmpeg = if encoder_succeeds {
            self.write_script(
                "ffmpeg",
                "#!/bin/sh\nfor last; do :; done\n: > \"$last\"\nexit 0\n",
            )?
        } else {
            self.write_script(
                "ffmpeg",
                "#!/bin/sh\necho 'Error opening output file: Permission denied' >&2\nexit 1\n",
            )?
        };
        self.write_config(&ffmpeg.display().to_string(), &ffprobe.display().to_string())
    }

    #[cfg(unix)]
    fn write_script(&self, name: &str, body: &str) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let path = self.data_dir().join("bin").join(name);
        fs::write(&path, body)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    pub fn add_inputs(&self, text: &str, images: usize) -> Result<()> {
        fs::write(
            self.data_dir().join("simplified-text.json"),
            serde_json::json!({ "text": text }).to_string(),
        )?;
        fs::write(self.data_dir().join("audio").join("narration.mp3"), b"id3")?;
        for i in 1..=images {
            fs::write(
                self.data_dir().join("images").join(format!("image-{i}.png")),
                b"png",
            )?;
        }
        Ok(())
    }

    pub fn temp_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(self.data_dir().join("temp"))? {
            files.push(entry?.path());
        }
        Ok(files)
    }
}
