//! Toolchains: how to compile and run a source file for one language.

use std::path::Path;

/// Name given to the source file (without extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStem {
    Fixed(String),
    /// The first `public class`, or `Main` when there is none.
    PublicClass,
}

/// One external command. Arguments may hold the placeholders `{src}`,
/// `{bin}`, `{dir}` and `{stem}`; `program` may be `{bin}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub(crate) fn render(&self, paths: &SourcePaths) -> (String, Vec<String>) {
        (
            paths.fill(&self.program),
            self.args.iter().map(|a| paths.fill(a)).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Other names accepted for this language, lowercase.
    pub aliases: Vec<String>,
    pub extension: String,
    pub stem: SourceStem,
    pub compile: Option<Invocation>,
    pub run: Invocation,
}

impl Toolchain {
    /// An interpreted language: run the source file directly.
    pub fn interpreted(extension: &str, run: Invocation) -> Self {
        Self {
            aliases: Vec::new(),
            extension: extension.into(),
            stem: SourceStem::Fixed("main".into()),
            compile: None,
            run,
        }
    }

    pub fn with_compile(mut self, compile: Invocation) -> Self {
        self.compile = Some(compile);
        self
    }

    pub fn with_stem(mut self, stem: SourceStem) -> Self {
        self.stem = stem;
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_lowercase()).collect();
        self
    }

    pub(crate) fn stem_for(&self, code: &str) -> String {
        match &self.stem {
            SourceStem::Fixed(stem) => stem.clone(),
            SourceStem::PublicClass => public_class(code).unwrap_or_else(|| "Main".into()),
        }
    }
}

/// The five languages the web client offers.
pub fn default_toolchains() -> Vec<(String, Toolchain)> {
    vec![
        (
            "python".into(),
            Toolchain::interpreted("py", Invocation::new("python3", &["{src}"]))
                .with_aliases(&["py"]),
        ),
        (
            "javascript".into(),
            Toolchain::interpreted("js", Invocation::new("node", &["{src}"]))
                .with_aliases(&["js", "node"]),
        ),
        (
            "java".into(),
            Toolchain::interpreted("java", Invocation::new("java", &["-cp", "{dir}", "{stem}"]))
                .with_compile(Invocation::new("javac", &["{src}"]))
                .with_stem(SourceStem::PublicClass),
        ),
        (
            "cpp".into(),
            Toolchain::interpreted("cpp", Invocation::new("{bin}", &[]))
                .with_compile(Invocation::new("g++", &["-std=c++17", "-o", "{bin}", "{src}"]))
                .with_aliases(&["c++"]),
        ),
        (
            "c".into(),
            Toolchain::interpreted("c", Invocation::new("{bin}", &[]))
                .with_compile(Invocation::new("gcc", &["-o", "{bin}", "{src}"])),
        ),
    ]
}

/// Name of the first `public class` declared in Java source.
pub fn public_class(code: &str) -> Option<String> {
    const MARKER: &str = "public class ";
    let start = code.find(MARKER)? + MARKER.len();
    let name: String = code[start..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Concrete paths for one execution.
pub(crate) struct SourcePaths {
    pub src: String,
    pub bin: String,
    pub dir: String,
    pub stem: String,
}

impl SourcePaths {
    pub fn new(dir: &Path, stem: &str, extension: &str) -> Self {
        Self {
            src: dir.join(format!("{stem}.{extension}")).display().to_string(),
            bin: dir.join(format!("{stem}_out")).display().to_string(),
            dir: dir.display().to_string(),
            stem: stem.to_string(),
        }
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("{src}", &self.src)
            .replace("{bin}", &self.bin)
            .replace("{dir}", &self.dir)
            .replace("{stem}", &self.stem)
    }
}
