use std::fmt;

/// External executables the pipelines shell out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Curl,
    Zcat,
    /// Assembles captured frames into an animated image (ImageMagick `convert`).
    ImageEncoder,
    TmAlign,
    Scwrl,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Curl,
        Tool::Zcat,
        Tool::ImageEncoder,
        Tool::TmAlign,
        Tool::Scwrl,
    ];

    pub fn default_executable(self) -> &'static str {
        match self {
            Tool::Curl => "curl",
            Tool::Zcat => "zcat",
            Tool::ImageEncoder => "convert",
            Tool::TmAlign => "TMalign",
            Tool::Scwrl => "Scwrl4",
        }
    }

    /// The key naming this tool in configuration files.
    pub fn config_key(self) -> &'static str {
        match self {
            Tool::Curl => "curl",
            Tool::Zcat => "zcat",
            Tool::ImageEncoder => "image-encoder",
            Tool::TmAlign => "tmalign",
            Tool::Scwrl => "scwrl",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// The executable (name on `PATH` or explicit path) configured for each [`Tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub curl: String,
    pub zcat: String,
    pub image_encoder: String,
    pub tmalign: String,
    pub scwrl: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            curl: Tool::Curl.default_executable().to_string(),
            zcat: Tool::Zcat.default_executable().to_string(),
            image_encoder: Tool::ImageEncoder.default_executable().to_string(),
            tmalign: Tool::TmAlign.default_executable().to_string(),
            scwrl: Tool::Scwrl.default_executable().to_string(),
        }
    }
}

impl ToolPaths {
    pub fn get(&self, tool: Tool) -> &str {
        match tool {
            Tool::Curl => &self.curl,
            Tool::Zcat => &self.zcat,
            Tool::ImageEncoder => &self.image_encoder,
            Tool::TmAlign => &self.tmalign,
            Tool::Scwrl => &self.scwrl,
        }
    }

    pub fn set(&mut self, tool: Tool, executable: impl Into<String>) {
        let slot = match tool {
            Tool::Curl => &mut self.curl,
            Tool::Zcat => &mut self.zcat,
            Tool::ImageEncoder => &mut self.image_encoder,
            Tool::TmAlign => &mut self.tmalign,
            Tool::Scwrl => &mut self.scwrl,
        };
        *slot = executable.into();
    }

    pub fn with(mut self, tool: Tool, executable: impl Into<String>) -> Self {
        self.set(tool, executable);
        self
    }
}
