//! Fixups for generated Dart source.

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{PatchError, PatchResult};
use crate::rule::{Fixup, PatchRule};

/// Words that may precede an identifier without declaring it.
const NON_TYPE_WORDS: &[&str] = &[
    "return", "await", "yield", "throw", "else", "case", "assert", "print",
];

/// A field the widget state must declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateField {
    pub ty: String,
    pub name: String,
    pub initializer: Option<String>,
}

impl StateField {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            initializer: None,
        }
    }

    pub fn initialized(mut self, value: impl Into<String>) -> Self {
        self.initializer = Some(value.into());
        self
    }

    /// Source text of the declaration, e.g. `bool isScanning = false;`.
    pub fn declaration(&self) -> String {
        match &self.initializer {
            Some(value) => format!("{} {} = {};", self.ty, self.name, value),
            None => format!("{} {};", self.ty, self.name),
        }
    }
}

/// Declares missing state fields at the top of the first `State` subclass.
#[derive(Debug, Clone)]
pub struct EnsureStateFields {
    fields: Vec<(StateField, Regex)>,
    owner: Regex,
}

impl EnsureStateFields {
    const NAME: &'static str = "ensure_state_fields";

    pub fn new(fields: Vec<StateField>) -> PatchResult<Self> {
        let owner = Regex::new(r"class\s+_\w*State\s+extends\s+State<\w+>\s*\{")
            .map_err(|e| PatchError::invalid_rule(Self::NAME, e))?;
        let fields = fields
            .into_iter()
            .map(|field| {
                let pattern = format!(
                    r"(?m)^\s*(?:(?:late|final|static|const)\s+)*(?P<ty>[A-Za-z_][\w<>?,\[\] ]*?)\s+{}\s*[=;]",
                    regex::escape(&field.name)
                );
                Regex::new(&pattern)
                    .map(|re| (field, re))
                    .map_err(|e| PatchError::invalid_rule(Self::NAME, e))
            })
            .collect::<PatchResult<Vec<_>>>()?;
        Ok(Self { fields, owner })
    }

    fn is_declared(content: &str, pattern: &Regex) -> bool {
        pattern.captures_iter(content).any(|caps| {
            let ty = caps.name("ty").map(|m| m.as_str().trim()).unwrap_or_default();
            let first = ty.split_whitespace().next().unwrap_or_default();
            !NON_TYPE_WORDS.contains(&first)
        })
    }

    /// Fields with no declaration in `content`, in catalog order.
    pub fn missing<'a>(&'a self, content: &str) -> Vec<&'a StateField> {
        self.fields
            .iter()
            .filter(|(_, pattern)| !Self::is_declared(content, pattern))
            .map(|(field, _)| field)
            .collect()
    }
}

impl PatchRule for EnsureStateFields {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        let missing = self.missing(content);
        if missing.is_empty() {
            return Ok(Fixup::Unchanged);
        }
        let Some(owner) = self.owner.find(content) else {
            return Ok(Fixup::Skipped(format!(
                "no State class to receive {} missing field(s)",
                missing.len()
            )));
        };

        let block: String = missing
            .iter()
            .map(|field| format!("\n  {}", field.declaration()))
            .collect();
        debug!("{}: declaring {} field(s)", Self::NAME, missing.len());

        let mut patched = String::with_capacity(content.len() + block.len());
        patched.push_str(&content[..owner.end()]);
        patched.push_str(&block);
        patched.push_str(&content[owner.end()..]);
        Ok(Fixup::Applied(patched))
    }
}

/// Adds missing `import` directives above the first existing one.
#[derive(Debug, Clone)]
pub struct EnsureImports {
    imports: Vec<(String, Regex)>,
}

impl EnsureImports {
    const NAME: &'static str = "ensure_imports";

    pub fn new<I, S>(uris: I) -> PatchResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let imports = uris
            .into_iter()
            .map(|uri| {
                let uri = uri.into();
                let pattern = format!(r#"import\s+['"]{}['"]"#, regex::escape(&uri));
                Regex::new(&pattern)
                    .map(|re| (uri, re))
                    .map_err(|e| PatchError::invalid_rule(Self::NAME, e))
            })
            .collect::<PatchResult<Vec<_>>>()?;
        Ok(Self { imports })
    }
}

impl PatchRule for EnsureImports {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        let block: String = self
            .imports
            .iter()
            .filter(|(_, pattern)| !pattern.is_match(content))
            .map(|(uri, _)| format!("import '{}';\n", uri))
            .collect();
        if block.is_empty() {
            return Ok(Fixup::Unchanged);
        }

        let insert_at = content
            .match_indices("import ")
            .map(|(i, _)| i)
            .find(|&i| i == 0 || content.as_bytes()[i - 1] == b'\n')
            .unwrap_or(0);

        let mut patched = String::with_capacity(content.len() + block.len());
        patched.push_str(&content[..insert_at]);
        patched.push_str(&block);
        patched.push_str(&content[insert_at..]);
        Ok(Fixup::Applied(patched))
    }
}

/// Calls `requestPermissions()` from `initState` once the first frame is
/// drawn, when the state defines that method but never calls it.
#[derive(Debug, Clone)]
pub struct EnsureInitStateHook {
    definition: Regex,
    anchor: Regex,
}

impl EnsureInitStateHook {
    const NAME: &'static str = "ensure_init_state_hook";
    const CALL: &'static str = "requestPermissions();";
    const HOOK: &'static str = "\n    WidgetsBinding.instance.addPostFrameCallback((_) {\n      requestPermissions();\n    });";

    pub fn new() -> PatchResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| PatchError::invalid_rule(Self::NAME, e))
        };
        Ok(Self {
            definition: compile(r"\brequestPermissions\s*\(\s*\)\s*(?:async\s*)?\{")?,
            anchor: compile(r"(?s)void\s+initState\s*\(\s*\)\s*\{.*?super\.initState\(\);")?,
        })
    }
}

impl PatchRule for EnsureInitStateHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        if content.contains(Self::CALL) || !self.definition.is_match(content) {
            return Ok(Fixup::Unchanged);
        }
        let Some(anchor) = self.anchor.find(content) else {
            warn!(
                "{}: requestPermissions() is defined but initState has no super call",
                Self::NAME
            );
            return Ok(Fixup::Skipped("no super.initState() call to hook".to_string()));
        };

        let mut patched = String::with_capacity(content.len() + Self::HOOK.len());
        patched.push_str(&content[..anchor.end()]);
        patched.push_str(Self::HOOK);
        patched.push_str(&content[anchor.end()..]);
        Ok(Fixup::Applied(patched))
    }
}
