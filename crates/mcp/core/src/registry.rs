//! The immutable tool registry and its filtered views.
//!
//! A registry is built once from the full catalog. Every filtering operation
//! returns a *new* registry sharing the underlying declarations through an
//! `Arc`; predicates are layered on the copy. Filter order is fixed —
//! read-only, feature flags, additional-tools whitelist, toolset gate — and
//! identical everywhere a tool list is produced, so what a client sees in
//! `tools/list` is exactly what it can call.

use crate::error::RegistryError;
use crate::prompt::PromptDeclaration;
use crate::resource::ResourceTemplate;
use crate::tool::ToolDeclaration;
use crate::toolset::ToolsetMeta;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Per-request feature flag evaluator. Absent checker means every flag
/// reads false: `enable_flag` tools stay hidden, `disable_flag` tools stay
/// visible.
pub type FeatureChecker = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Which item category a specialized per-request view may answer for.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Restriction {
    None,
    Tools(Option<String>),
    Prompts(Option<String>),
    Resources,
    Empty,
}

struct RegistryInner<D> {
    toolsets: BTreeMap<String, ToolsetMeta>,
    /// Sorted by (toolset id, tool name) at build time.
    tools: Vec<ToolDeclaration<D>>,
    index: HashMap<String, usize>,
    prompts: Vec<PromptDeclaration<D>>,
    resources: Vec<ResourceTemplate<D>>,
}

/// The set of all declared tools, resource templates, and prompts, plus the
/// view predicates applied so far.
pub struct Registry<D> {
    inner: Arc<RegistryInner<D>>,
    aliases: Arc<HashMap<String, String>>,
    warned_aliases: Arc<Mutex<HashSet<String>>>,
    read_only: bool,
    /// `None` means the toolset gate is disabled (everything enabled).
    enabled_toolsets: Option<BTreeSet<String>>,
    additional_tools: BTreeSet<String>,
    unrecognized: Vec<String>,
    feature_checker: Option<FeatureChecker>,
    restriction: Restriction,
}

impl<D> std::fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("read_only", &self.read_only)
            .field("enabled_toolsets", &self.enabled_toolsets)
            .field("additional_tools", &self.additional_tools)
            .field("unrecognized", &self.unrecognized)
            .field("restriction", &self.restriction)
            .finish_non_exhaustive()
    }
}

impl<D> Clone for Registry<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            aliases: Arc::clone(&self.aliases),
            warned_aliases: Arc::clone(&self.warned_aliases),
            read_only: self.read_only,
            enabled_toolsets: self.enabled_toolsets.clone(),
            additional_tools: self.additional_tools.clone(),
            unrecognized: self.unrecognized.clone(),
            feature_checker: self.feature_checker.clone(),
            restriction: self.restriction.clone(),
        }
    }
}

impl<D> Registry<D> {
    pub fn builder() -> RegistryBuilder<D> {
        RegistryBuilder::default()
    }

    /// A registry with nothing in it. Used as the placeholder while wiring
    /// dynamic state, and by tests. Built directly: with no declarations
    /// there is nothing to validate.
    pub fn empty() -> Self {
        Registry {
            inner: Arc::new(RegistryInner {
                toolsets: BTreeMap::new(),
                tools: Vec::new(),
                index: HashMap::new(),
                prompts: Vec::new(),
                resources: Vec::new(),
            }),
            aliases: Arc::new(HashMap::new()),
            warned_aliases: Arc::new(Mutex::new(HashSet::new())),
            read_only: false,
            enabled_toolsets: None,
            additional_tools: BTreeSet::new(),
            unrecognized: Vec::new(),
            feature_checker: None,
            restriction: Restriction::None,
        }
    }

    // ── View transformations ───────────────────────────────────────────

    /// Exclude write tools when `read_only` is set.
    #[must_use]
    pub fn with_read_only(&self, read_only: bool) -> Self {
        let mut next = self.clone();
        next.read_only = read_only;
        next
    }

    /// Set the enabled-toolset gate from raw user input.
    ///
    /// `all` anywhere in the list disables the gate entirely; `default`
    /// expands to the toolsets flagged as default; unknown ids are collected
    /// for [`Registry::unrecognized_toolsets`] but are not fatal. An empty
    /// slice enables nothing (dynamic-toolset mode starts this way).
    #[must_use]
    pub fn with_toolsets<S: AsRef<str>>(&self, ids: &[S]) -> Self {
        let mut enabled = BTreeSet::new();
        let mut unrecognized = self.unrecognized.clone();
        let mut everything = false;

        for raw in ids {
            let id = raw.as_ref().trim().to_lowercase();
            if id.is_empty() {
                continue;
            }
            match id.as_str() {
                "all" => everything = true,
                "default" => {
                    enabled.extend(
                        self.inner
                            .toolsets
                            .values()
                            .filter(|t| t.default)
                            .map(|t| t.id.clone()),
                    );
                }
                _ if self.inner.toolsets.contains_key(&id) => {
                    enabled.insert(id);
                }
                _ => unrecognized.push(id),
            }
        }

        let mut next = self.clone();
        next.enabled_toolsets = if everything { None } else { Some(enabled) };
        next.unrecognized = unrecognized;
        next
    }

    /// A view with one more toolset enabled. No-op when the gate is already
    /// disabled; unknown ids are recorded, not fatal.
    #[must_use]
    pub fn with_toolset_enabled(&self, id: &str) -> Self {
        let id = id.trim().to_lowercase();
        let mut next = self.clone();
        match &mut next.enabled_toolsets {
            None => {}
            Some(set) => {
                if self.inner.toolsets.contains_key(&id) {
                    set.insert(id);
                } else {
                    next.unrecognized.push(id);
                }
            }
        }
        next
    }

    /// Additive whitelist of tool names that bypass the toolset gate.
    /// Names are alias-resolved first; read-only and flag gates still apply.
    #[must_use]
    pub fn with_tools<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut next = self.clone();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let canonical = self.resolve_alias(name);
            if !self.inner.index.contains_key(&canonical) {
                tracing::warn!(tool = canonical.as_str(), "unknown tool in allowlist");
            }
            next.additional_tools.insert(canonical);
        }
        next
    }

    #[must_use]
    pub fn with_feature_checker(&self, checker: FeatureChecker) -> Self {
        let mut next = self.clone();
        next.feature_checker = Some(checker);
        next
    }

    /// Merge additional deprecated aliases into the alias map.
    #[must_use]
    pub fn with_deprecated_aliases(&self, aliases: HashMap<String, String>) -> Self {
        let mut merged = (*self.aliases).clone();
        merged.extend(aliases);
        let mut next = self.clone();
        next.aliases = Arc::new(merged);
        next
    }

    /// Narrow the view to exactly what one MCP method needs to answer.
    /// Unknown methods yield an empty view. Previously-applied filters stay
    /// in force.
    #[must_use]
    pub fn for_mcp_request(&self, method: &str, item: Option<&str>) -> Self {
        let restriction = match method {
            "tools/list" => Restriction::Tools(None),
            "tools/call" => match item {
                Some(name) => Restriction::Tools(Some(self.resolve_alias(name))),
                None => Restriction::Empty,
            },
            "prompts/list" => Restriction::Prompts(None),
            "prompts/get" => match item {
                Some(name) => Restriction::Prompts(Some(name.to_string())),
                None => Restriction::Empty,
            },
            "resources/list" | "resources/read" | "resources/templates/list" => {
                Restriction::Resources
            }
            _ => Restriction::Empty,
        };
        let mut next = self.clone();
        next.restriction = restriction;
        next
    }

    // ── Derivation ─────────────────────────────────────────────────────

    /// Toolset ids that were requested but never declared.
    pub fn unrecognized_toolsets(&self) -> &[String] {
        &self.unrecognized
    }

    /// Resolve a possibly-deprecated tool name to its canonical form,
    /// warning at most once per alias per process.
    pub fn resolve_alias(&self, name: &str) -> String {
        match self.aliases.get(name) {
            Some(canonical) => {
                let mut warned = self
                    .warned_aliases
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if warned.insert(name.to_string()) {
                    tracing::warn!(
                        alias = name,
                        canonical = canonical.as_str(),
                        "tool name is deprecated; use the canonical name"
                    );
                }
                canonical.clone()
            }
            None => name.to_string(),
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.feature_checker.as_ref().is_some_and(|f| f(name))
    }

    /// The fixed filter predicate: read-only, feature flags, then the
    /// whitelist-or-toolset gate.
    fn passes(&self, decl: &ToolDeclaration<D>) -> bool {
        if self.read_only && !decl.read_only {
            return false;
        }
        if let Some(flag) = &decl.enable_flag
            && !self.flag(flag)
        {
            return false;
        }
        if let Some(flag) = &decl.disable_flag
            && self.flag(flag)
        {
            return false;
        }
        if self.additional_tools.contains(&decl.name) {
            return true;
        }
        match &self.enabled_toolsets {
            None => true,
            Some(set) => set.contains(&decl.toolset),
        }
    }

    /// Declarations passing every predicate, sorted by (toolset, name).
    pub fn available_tools(&self) -> Vec<&ToolDeclaration<D>> {
        let only = match &self.restriction {
            Restriction::None | Restriction::Tools(None) => None,
            Restriction::Tools(Some(name)) => Some(name.as_str()),
            _ => return Vec::new(),
        };
        self.inner
            .tools
            .iter()
            .filter(|t| only.is_none_or(|n| n == t.name))
            .filter(|t| self.passes(t))
            .collect()
    }

    /// Look up a callable tool by (possibly deprecated) name within the
    /// current view.
    pub fn lookup(&self, name: &str) -> Option<&ToolDeclaration<D>> {
        let canonical = self.resolve_alias(name);
        match &self.restriction {
            Restriction::None | Restriction::Tools(None) => {}
            Restriction::Tools(Some(only)) if *only == canonical => {}
            _ => return None,
        }
        let idx = *self.inner.index.get(&canonical)?;
        let decl = &self.inner.tools[idx];
        self.passes(decl).then_some(decl)
    }

    /// All declared toolsets, sorted by id, with their enabled status.
    pub fn toolsets(&self) -> Vec<(&ToolsetMeta, bool)> {
        self.inner
            .toolsets
            .values()
            .map(|t| (t, self.is_toolset_enabled(&t.id)))
            .collect()
    }

    pub fn toolset(&self, id: &str) -> Option<&ToolsetMeta> {
        self.inner.toolsets.get(id)
    }

    pub fn is_toolset_enabled(&self, id: &str) -> bool {
        match &self.enabled_toolsets {
            None => true,
            Some(set) => set.contains(id),
        }
    }

    /// Every tool declared under a toolset, ignoring view predicates.
    /// Used by dynamic-toolset discovery before a set is enabled.
    pub fn toolset_tools(&self, id: &str) -> Vec<&ToolDeclaration<D>> {
        self.inner.tools.iter().filter(|t| t.toolset == id).collect()
    }

    /// Prompts visible in the current view, sorted by name.
    pub fn prompts(&self) -> Vec<&PromptDeclaration<D>> {
        let only = match &self.restriction {
            Restriction::None | Restriction::Prompts(None) => None,
            Restriction::Prompts(Some(name)) => Some(name.as_str()),
            _ => return Vec::new(),
        };
        self.inner
            .prompts
            .iter()
            .filter(|p| only.is_none_or(|n| n == p.name))
            .collect()
    }

    pub fn prompt(&self, name: &str) -> Option<&PromptDeclaration<D>> {
        self.prompts().into_iter().find(|p| p.name == name)
    }

    /// Resource templates visible in the current view.
    pub fn resource_templates(&self) -> Vec<&ResourceTemplate<D>> {
        match &self.restriction {
            Restriction::None | Restriction::Resources => {
                self.inner.resources.iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// First template matching the URI, with its bound variables.
    pub fn match_resource(
        &self,
        uri: &str,
    ) -> Option<(&ResourceTemplate<D>, BTreeMap<String, String>)> {
        self.resource_templates()
            .into_iter()
            .find_map(|t| t.matches(uri).map(|vars| (t, vars)))
    }

    /// Union of the required scopes of every available tool.
    pub fn required_scopes(&self) -> BTreeSet<String> {
        self.available_tools()
            .into_iter()
            .flat_map(|t| t.required_scopes.iter().cloned())
            .collect()
    }
}

/// Accumulates declarations and validates them into a [`Registry`].
pub struct RegistryBuilder<D> {
    toolsets: Vec<ToolsetMeta>,
    tools: Vec<ToolDeclaration<D>>,
    prompts: Vec<PromptDeclaration<D>>,
    resources: Vec<ResourceTemplate<D>>,
    aliases: HashMap<String, String>,
}

impl<D> Default for RegistryBuilder<D> {
    fn default() -> Self {
        Self {
            toolsets: Vec::new(),
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
            aliases: HashMap::new(),
        }
    }
}

impl<D> RegistryBuilder<D> {
    #[must_use]
    pub fn toolset(mut self, meta: ToolsetMeta) -> Self {
        self.toolsets.push(meta);
        self
    }

    #[must_use]
    pub fn tool(mut self, decl: ToolDeclaration<D>) -> Self {
        self.tools.push(decl);
        self
    }

    #[must_use]
    pub fn tools(mut self, decls: impl IntoIterator<Item = ToolDeclaration<D>>) -> Self {
        self.tools.extend(decls);
        self
    }

    #[must_use]
    pub fn prompt(mut self, decl: PromptDeclaration<D>) -> Self {
        self.prompts.push(decl);
        self
    }

    #[must_use]
    pub fn resource_template(mut self, template: ResourceTemplate<D>) -> Self {
        self.resources.push(template);
        self
    }

    /// Register a deprecated alias for a canonical tool name.
    #[must_use]
    pub fn alias(mut self, deprecated: &str, canonical: &str) -> Self {
        self.aliases
            .insert(deprecated.to_string(), canonical.to_string());
        self
    }

    pub fn build(self) -> Result<Registry<D>, RegistryError> {
        let mut toolsets = BTreeMap::new();
        for meta in self.toolsets {
            if toolsets.insert(meta.id.clone(), meta.clone()).is_some() {
                return Err(RegistryError::DuplicateToolset(meta.id));
            }
        }

        let mut tools = self.tools;
        tools.sort_by(|a, b| (&a.toolset, &a.name).cmp(&(&b.toolset, &b.name)));
        let mut index = HashMap::new();
        for (i, decl) in tools.iter().enumerate() {
            if index.insert(decl.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateTool(decl.name.clone()));
            }
            if !decl.toolset.is_empty() && !toolsets.contains_key(&decl.toolset) {
                return Err(RegistryError::UndeclaredToolset {
                    tool: decl.name.clone(),
                    toolset: decl.toolset.clone(),
                });
            }
        }

        for (alias, target) in &self.aliases {
            if !index.contains_key(target) {
                return Err(RegistryError::DanglingAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        let mut prompts = self.prompts;
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        let mut seen = HashSet::new();
        for p in &prompts {
            if !seen.insert(p.name.clone()) {
                return Err(RegistryError::DuplicatePrompt(p.name.clone()));
            }
        }

        let mut resources = self.resources;
        resources.sort_by(|a, b| a.uri_template.cmp(&b.uri_template));
        let mut seen = HashSet::new();
        for r in &resources {
            if !seen.insert(r.uri_template.clone()) {
                return Err(RegistryError::DuplicateResourceTemplate(
                    r.uri_template.clone(),
                ));
            }
        }

        Ok(Registry {
            inner: Arc::new(RegistryInner {
                toolsets,
                tools,
                index,
                prompts,
                resources,
            }),
            aliases: Arc::new(self.aliases),
            warned_aliases: Arc::new(Mutex::new(HashSet::new())),
            read_only: false,
            enabled_toolsets: None,
            additional_tools: BTreeSet::new(),
            unrecognized: Vec::new(),
            feature_checker: None,
            restriction: Restriction::None,
        })
    }
}
