/// Assembly - a named, branchable pipeline builder context
///
/// Each DSL call appends one stage to the flow's graph and replaces the
/// assembly's current scope with the derived one. Branches fork from the
/// current tail; their final scope is registered flow-wide so joins can refer
/// to them by name.
use crate::assembly::options::{
    AssertOptions, CopyOptions, EachOptions, EveryOptions, GroupByOptions, JoinInputs, JoinOptions,
};
use crate::assembly::registry::SharedFlow;
use crate::config::BuilderConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::plan::derive::{check_arguments, derive_scope, Derivation};
use crate::plan::flow_plan::BranchOutput;
use crate::plan::joiner::Joiner;
use crate::plan::operation::{Capability, Operation};
use crate::plan::stage::{OutputSelector, StageId, StageOperator};
use crate::schema::fields::{
    dedup_join_fields, difference, field_names, intersection, is_subset, missing_from, union_dedup,
};
use crate::schema::{resolve_type, Fields, Scope};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Where an assembly starts from
#[derive(Clone, Debug, PartialEq)]
pub enum Parent {
    /// Top of a flow: starts from the source of the same name, or empty
    Root { flow: String },
    /// Branch: continues the parent's tail with a copy of its scope
    Assembly {
        name: String,
        tail: StageId,
        scope: Scope,
    },
}

pub struct Assembly {
    name: String,
    parent: Parent,
    head: StageId,
    tail: StageId,
    scope: Scope,
    every_applied: bool,
    shared: SharedFlow,
}

impl Assembly {
    fn open(name: &str, parent: Parent, shared: SharedFlow) -> AssemblyResult<Self> {
        let (upstream, scope) = match &parent {
            Parent::Root { .. } => {
                let source = shared.borrow().sources.get(name).ok().cloned();
                match source {
                    Some(source) => (Some(source.tail), source.scope.renamed(name)),
                    None => (None, Scope::empty(name)),
                }
            }
            Parent::Assembly { tail, scope, .. } => (Some(*tail), scope.renamed(name)),
        };
        let head = shared
            .borrow_mut()
            .graph
            .add(name, StageOperator::Head { upstream }, scope.clone())?;
        tracing::debug!("Opened assembly '{}' at stage {} (upstream: {:?})", name, head, upstream);

        Ok(Self {
            name: name.to_string(),
            parent,
            head,
            tail: head,
            scope,
            every_applied: false,
            shared,
        })
    }

    /// Open an assembly, run `block` on it and register the result. A failure
    /// anywhere removes every stage and branch the build added.
    pub(crate) fn build<F>(name: &str, parent: Parent, shared: &SharedFlow, block: F) -> AssemblyResult<()>
    where
        F: FnOnce(&mut Assembly) -> AssemblyResult<()>,
    {
        let checkpoint = shared.borrow().checkpoint();
        let result = Assembly::open(name, parent, Rc::clone(shared)).and_then(|mut assembly| {
            block(&mut assembly)?;
            assembly.register()
        });
        if let Err(err) = result {
            shared.borrow_mut().rollback(checkpoint);
            tracing::debug!("Discarded failed assembly '{}': {}", name, err);
            return Err(err);
        }
        Ok(())
    }

    /// Record this assembly's final scope in the flow-wide registry
    fn register(self) -> AssemblyResult<()> {
        let mut state = self.shared.borrow_mut();
        let strict = state.config.strict_branch_names;
        state.branches.register(
            &self.name,
            BranchOutput {
                scope: self.scope,
                tail: self.tail,
            },
            strict,
        )?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &Parent {
        &self.parent
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn head(&self) -> StageId {
        self.head
    }

    pub fn tail(&self) -> StageId {
        self.tail
    }

    /// Was the most recent stage an aggregation?
    pub fn every_applied(&self) -> bool {
        self.every_applied
    }

    fn config(&self) -> BuilderConfig {
        self.shared.borrow().config.clone()
    }

    pub fn debug_scope(&self) {
        tracing::debug!("Current scope for '{}':\n  {}\n----------", self.name, self.scope);
    }

    fn append(&mut self, operator: StageOperator, scope: Scope) -> AssemblyResult<StageId> {
        let kind = operator.kind();
        let (id, trace) = {
            let mut state = self.shared.borrow_mut();
            let id = state.graph.add(&self.name, operator, scope.clone())?;
            (id, state.config.trace_scopes)
        };
        tracing::debug!("Appended {:?} stage {} to '{}'", kind, id, self.name);
        if trace {
            tracing::debug!("  {}", scope);
        }
        self.tail = id;
        self.scope = scope;
        Ok(id)
    }

    fn make_each(
        &mut self,
        arguments: Fields,
        operation: Operation,
        output: OutputSelector,
        declared: Option<Vec<String>>,
    ) -> AssemblyResult<()> {
        let resolved = arguments.resolve(self.scope.fields());
        check_arguments(&self.name, &resolved, self.scope.fields())?;
        let scope = derive_scope(
            &self.name,
            &[&self.scope],
            Derivation::RowTransform {
                declared: declared.as_deref(),
            },
        )?;
        self.append(
            StageOperator::Each {
                upstream: self.tail,
                arguments,
                operation,
                output,
            },
            scope,
        )?;
        self.every_applied = false;
        Ok(())
    }

    fn make_every(&mut self, arguments: Fields, operation: Operation, output: Option<Vec<String>>) -> AssemblyResult<()> {
        let values = self
            .scope
            .grouping()
            .map(|g| g.values.clone())
            .unwrap_or_default();
        let resolved = arguments.resolve(&values);
        let assertion = matches!(operation, Operation::Assertion { .. });
        let declared = if assertion {
            Vec::new()
        } else {
            output.unwrap_or_else(|| resolved.clone())
        };
        if let Some(grouping) = self.scope.grouping() {
            let clash = intersection(&declared, &grouping.fields);
            if !clash.is_empty() {
                return Err(AssemblyError::precondition(
                    self.name.clone(),
                    "aggregation output collides with grouping fields; declare an output name",
                    clash,
                ));
            }
        }
        let rule = if assertion {
            Derivation::GroupAssertion
        } else {
            Derivation::Aggregation {
                arguments: &resolved,
                declared: &declared,
            }
        };
        let scope = derive_scope(&self.name, &[&self.scope], rule)?;
        self.append(
            StageOperator::Every {
                upstream: self.tail,
                arguments,
                operation,
                declared,
            },
            scope,
        )?;
        if !assertion {
            self.every_applied = true;
        }
        Ok(())
    }

    fn set_primary(&mut self, key: Option<Vec<String>>) -> AssemblyResult<()> {
        let mut scope = self.scope.clone().with_primary_key(key.clone())?;
        if let Some(grouping) = scope.grouping_mut() {
            grouping.primary_key = key;
        }
        self.scope = scope;
        Ok(())
    }

    fn require_fields(&self, operation: &str, fields: &[String]) -> AssemblyResult<()> {
        let missing = missing_from(fields, self.scope.fields());
        if !missing.is_empty() {
            return Err(AssemblyError::invalid_fields(
                self.name.clone(),
                operation,
                missing,
                self.scope.fields().to_vec(),
            ));
        }
        Ok(())
    }

    /// Look up finished branches by name
    fn lookup_branches(&self, names: &[String]) -> AssemblyResult<Vec<BranchOutput>> {
        let state = self.shared.borrow();
        let entries = names
            .iter()
            .map(|name| state.branches.get(name).cloned())
            .collect::<AssemblyResult<Vec<_>>>();
        drop(state);
        entries.map_err(|e| e.with_context(format!("lookup from assembly '{}'", self.name)))
    }

    // ----- structure -----

    /// Fork a named child branch from the current tail
    pub fn branch<F>(&mut self, name: &str, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Assembly) -> AssemblyResult<()>,
    {
        let parent = Parent::Assembly {
            name: self.name.clone(),
            tail: self.tail,
            scope: self.scope.clone(),
        };
        Assembly::build(name, parent, &self.shared, block)?;
        Ok(self)
    }

    /// Declare the primary key of the current scope; an empty list clears it
    pub fn primary<I, S>(&mut self, fields: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = field_names(fields);
        self.set_primary(if key.is_empty() { None } else { Some(key) })?;
        Ok(self)
    }

    pub fn clear_primary(&mut self) -> AssemblyResult<&mut Self> {
        self.set_primary(None)?;
        Ok(self)
    }

    // ----- row-wise -----

    pub fn each(&mut self, arguments: impl Into<Fields>, options: EachOptions) -> AssemblyResult<&mut Self> {
        let output = if options.output.is_some() {
            OutputSelector::Results
        } else {
            OutputSelector::All
        };
        self.make_each(arguments.into(), options.operation, output, options.output)?;
        Ok(self)
    }

    /// Restrict the scope to exactly these fields, in this order
    pub fn project<I, S>(&mut self, fields: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = field_names(fields);
        self.require_fields("project", &fields)?;
        self.make_each(
            Fields::Names(fields.clone()),
            Operation::identity(),
            OutputSelector::Results,
            Some(fields),
        )?;
        Ok(self)
    }

    pub fn discard<I, S>(&mut self, fields: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = field_names(fields);
        self.require_fields("discard", &fields)?;
        let keep = difference(self.scope.fields(), &fields);
        self.project(keep)
    }

    /// Rename every field positionally
    pub fn bind_names<I, S>(&mut self, names: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = field_names(names);
        if names.len() != self.scope.fields().len() {
            return Err(AssemblyError::precondition(
                self.name.clone(),
                format!("bind_names needs {} names", self.scope.fields().len()),
                names,
            ));
        }
        let key = self.scope.primary_key().map(|key| {
            key.iter()
                .filter_map(|k| self.scope.fields().iter().position(|f| f == k))
                .map(|pos| names[pos].clone())
                .collect::<Vec<_>>()
        });
        self.make_each(
            Fields::All,
            Operation::identity_as(names.clone()),
            OutputSelector::Results,
            Some(names),
        )?;
        self.set_primary(key)?;
        Ok(self)
    }

    /// Rename fields by name; the primary key follows the rename
    pub fn rename<I, K, V>(&mut self, mapping: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: BTreeMap<String, String> = mapping.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let old_names = self.scope.fields().to_vec();
        let invalid: Vec<String> = mapping.keys().filter(|k| !old_names.contains(k)).cloned().collect();
        if !invalid.is_empty() {
            return Err(AssemblyError::invalid_fields(self.name.clone(), "rename", invalid, old_names));
        }

        let apply = |name: &String| mapping.get(name).cloned().unwrap_or_else(|| name.clone());
        let new_names: Vec<String> = old_names.iter().map(apply).collect();
        let new_key: Vec<String> = self.scope.primary_key().unwrap_or_default().iter().map(apply).collect();

        self.make_each(
            Fields::All,
            Operation::identity_as(new_names.clone()),
            OutputSelector::Results,
            Some(new_names),
        )?;
        self.primary(new_key)
    }

    /// Retype fields in place; names and order are unchanged
    pub fn cast<I, K, T>(&mut self, types: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: AsRef<str>,
    {
        let types: BTreeMap<String, String> = types
            .into_iter()
            .map(|(k, t)| (k.into(), t.as_ref().to_string()))
            .collect();
        let names: Vec<String> = types.keys().cloned().collect();
        self.require_fields("cast", &names)?;
        let data_types = types
            .iter()
            .map(|(field, type_name)| resolve_type(field, type_name))
            .collect::<AssemblyResult<Vec<_>>>()?;
        self.make_each(
            Fields::Names(names),
            Operation::Identity {
                rename: None,
                types: Some(data_types),
            },
            OutputSelector::Replace,
            None,
        )?;
        Ok(self)
    }

    /// Duplicate fields under new names, keeping the originals
    pub fn copy(&mut self, options: CopyOptions) -> AssemblyResult<&mut Self> {
        let from = options.from.resolve(self.scope.fields());
        self.require_fields("copy", &from)?;
        let into = options.into.unwrap_or_else(|| from.clone());
        if into.len() != from.len() {
            return Err(AssemblyError::precondition(
                self.name.clone(),
                format!("copy needs {} target names", from.len()),
                into,
            ));
        }
        let clashes: Vec<String> = from
            .iter()
            .zip(&into)
            .filter(|(src, dst)| src != dst && self.scope.contains(dst))
            .map(|(_, dst)| dst.clone())
            .collect();
        if !clashes.is_empty() {
            return Err(AssemblyError::precondition(
                self.name.clone(),
                "copy target already exists",
                clashes,
            ));
        }
        let output = union_dedup(self.scope.fields(), &into);
        self.make_each(
            options.from,
            Operation::identity_as(into),
            OutputSelector::All,
            Some(output),
        )?;
        Ok(self)
    }

    /// Identity stage
    pub fn pass(&mut self) -> AssemblyResult<&mut Self> {
        self.make_each(Fields::All, Operation::identity(), OutputSelector::All, None)?;
        Ok(self)
    }

    pub fn assert(&mut self, assertion: Arc<dyn Capability>, options: AssertOptions) -> AssemblyResult<&mut Self> {
        let level = options.level.unwrap_or(self.config().default_assertion_level);
        self.make_each(
            Fields::All,
            Operation::Assertion {
                capability: assertion,
                level,
            },
            OutputSelector::All,
            None,
        )?;
        Ok(self)
    }

    // ----- grouping -----

    /// Aggregate within the grouping established by the last group or join
    pub fn every(&mut self, arguments: impl Into<Fields>, options: EveryOptions) -> AssemblyResult<&mut Self> {
        self.make_every(arguments.into(), options.operation, options.output)?;
        Ok(self)
    }

    pub fn assert_group(&mut self, assertion: Arc<dyn Capability>, options: AssertOptions) -> AssemblyResult<&mut Self> {
        let level = options.level.unwrap_or(self.config().default_assertion_level);
        self.make_every(
            Fields::All,
            Operation::Assertion {
                capability: assertion,
                level,
            },
            None,
        )?;
        Ok(self)
    }

    fn open_group(&mut self, fields: Vec<String>, options: GroupByOptions) -> AssemblyResult<Vec<Scope>> {
        let incoming = self.scope.clone();
        let sort_fields = options.sort_by.unwrap_or_else(|| fields.clone());
        check_arguments(&self.name, &sort_fields, incoming.fields())?;
        let scope = derive_scope(&self.name, &[&incoming], Derivation::GroupBy { key: &fields })?;
        self.append(
            StageOperator::GroupBy {
                upstreams: vec![self.tail],
                group_fields: fields,
                sort_fields,
                reverse: options.reverse,
            },
            scope,
        )?;
        self.every_applied = false;
        Ok(vec![incoming])
    }

    pub fn group_by<I, S>(&mut self, fields: I, options: GroupByOptions) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open_group(field_names(fields), options)?;
        Ok(self)
    }

    /// Group, then run `block` against the grouping and reduce the result
    pub fn group_by_with<I, S, F>(&mut self, fields: I, options: GroupByOptions, block: F) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        let incoming = self.open_group(field_names(fields), options)?;
        self.every_block(&incoming, block)?;
        Ok(self)
    }

    /// Merge branches with identical fields into one group-by on their first field
    pub fn union<I, S>(&mut self, branches: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = branches.into_iter().map(|b| b.as_ref().to_string()).collect();
        let entries = self.lookup_branches(&names)?;
        let Some(first_field) = entries.first().and_then(|e| e.scope.fields().first()).cloned() else {
            return Err(AssemblyError::precondition(
                self.name.clone(),
                "union needs at least one branch with fields",
                names,
            ));
        };
        let key = vec![first_field];
        let incoming: Vec<&Scope> = entries.iter().map(|e| &e.scope).collect();
        let scope = derive_scope(&self.name, &incoming, Derivation::GroupBy { key: &key })?;
        self.append(
            StageOperator::GroupBy {
                upstreams: entries.iter().map(|e| e.tail).collect(),
                group_fields: key.clone(),
                sort_fields: key,
                reverse: false,
            },
            scope,
        )?;
        self.every_applied = false;
        Ok(self)
    }

    fn open_join(&mut self, options: JoinOptions) -> AssemblyResult<Vec<Scope>> {
        let (names, keys): (Vec<String>, Vec<Vec<String>>) = match options.inputs {
            JoinInputs::Shared { branches, key } => {
                let keys = vec![key; branches.len()];
                (branches, keys)
            }
            JoinInputs::PerBranch(keys) => keys.into_iter().unzip(),
        };
        if names.is_empty() {
            return Err(AssemblyError::precondition(self.name.clone(), "join needs at least one branch", names));
        }

        let entries = self.lookup_branches(&names)?;
        for ((name, key), entry) in names.iter().zip(&keys).zip(&entries) {
            check_arguments(&self.name, key, entry.scope.fields())
                .map_err(|e| e.with_context(format!("join key of branch '{}'", name)))?;
        }
        options
            .joiner
            .required_sides(names.len())
            .map_err(|e| e.with_context(format!("join in assembly '{}'", self.name)))?;

        let declared = match options.declared_fields {
            Some(declared) => {
                let width: usize = entries.iter().map(|e| e.scope.fields().len()).sum();
                if declared.len() != width {
                    return Err(AssemblyError::precondition(
                        self.name.clone(),
                        format!("join declares {} fields for {} incoming fields", declared.len(), width),
                        declared,
                    ));
                }
                declared
            }
            None => {
                let sides: Vec<(Vec<String>, Vec<String>)> = entries
                    .iter()
                    .zip(&keys)
                    .map(|(e, k)| (e.scope.fields().to_vec(), k.clone()))
                    .collect();
                dedup_join_fields(&sides, &self.config().dedup_suffix)
            }
        };

        // Left key wins: the first side's key, under its declared output names,
        // becomes the grouping key
        let left_fields = entries[0].scope.fields();
        let grouping_key: Vec<String> = keys[0]
            .iter()
            .filter_map(|k| left_fields.iter().position(|f| f == k))
            .filter_map(|pos| declared.get(pos).cloned())
            .collect();
        let incoming: Vec<&Scope> = entries.iter().map(|e| &e.scope).collect();
        let scope = derive_scope(
            &self.name,
            &incoming,
            Derivation::CoGroup {
                key: &grouping_key,
                declared: &declared,
            },
        )?;
        tracing::debug!("Joining {:?} on {:?} with {:?} in '{}'", names, keys, options.joiner, self.name);
        self.append(
            StageOperator::CoGroup {
                upstreams: entries.iter().map(|e| e.tail).collect(),
                group_fields: keys,
                declared_fields: declared,
                joiner: options.joiner,
            },
            scope,
        )?;
        self.every_applied = false;
        Ok(entries.into_iter().map(|e| e.scope).collect())
    }

    /// Join (co-group) finished branches
    pub fn join(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.open_join(options)?;
        Ok(self)
    }

    /// Join, then run `block` against the joined grouping and reduce the result
    pub fn join_with<F>(&mut self, options: JoinOptions, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        let incoming = self.open_join(options)?;
        self.every_block(&incoming, block)?;
        Ok(self)
    }

    pub fn co_group(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.join(options)
    }

    pub fn inner_join(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.join(options.joiner(Joiner::Inner))
    }

    pub fn left_join(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.join(options.joiner(Joiner::Left))
    }

    pub fn right_join(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.join(options.joiner(Joiner::Right))
    }

    pub fn outer_join(&mut self, options: JoinOptions) -> AssemblyResult<&mut Self> {
        self.join(options.joiner(Joiner::Outer))
    }

    pub fn inner_join_with<F>(&mut self, options: JoinOptions, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        self.join_with(options.joiner(Joiner::Inner), block)
    }

    pub fn left_join_with<F>(&mut self, options: JoinOptions, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        self.join_with(options.joiner(Joiner::Left), block)
    }

    pub fn right_join_with<F>(&mut self, options: JoinOptions, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        self.join_with(options.joiner(Joiner::Right), block)
    }

    pub fn outer_join_with<F>(&mut self, options: JoinOptions, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        self.join_with(options.joiner(Joiner::Outer), block)
    }

    // ----- every-block reduction -----

    /// Non-key fields of every incoming scope whose primary key lies within the
    /// grouping primary key, minus anything already emitted or aggregated
    fn first_fields(&self, incoming: &[Scope]) -> Vec<String> {
        let Some(grouping) = self.scope.grouping() else {
            return Vec::new();
        };
        let grouping_primary_key = grouping.primary_key.clone().unwrap_or_default();
        let mut first = Vec::new();
        for scope in incoming {
            if let Some(key) = scope.primary_key() {
                if is_subset(key, &grouping_primary_key) {
                    first = union_dedup(&first, &difference(scope.fields(), key));
                }
            }
        }
        let first = difference(&first, &grouping.fields);
        let first = difference(&first, &grouping.aggregated);
        intersection(&first, &grouping.values)
    }

    fn every_block<F>(&mut self, incoming: &[Scope], block: F) -> AssemblyResult<()>
    where
        F: FnOnce(&mut Aggregation<'_>) -> AssemblyResult<()>,
    {
        block(&mut Aggregation { assembly: &mut *self })?;

        if self.config().first_fields_reduction {
            let first = self.first_fields(incoming);
            if !first.is_empty() {
                tracing::info!("Firsting: {:?} in assembly: {}", first, self.name);
                self.make_every(Fields::Names(first.clone()), Operation::First, Some(first))?;
            }
        }

        if self.every_applied {
            let names = self
                .scope
                .grouping()
                .map(|g| g.fields.clone())
                .unwrap_or_else(|| self.scope.fields().to_vec());
            self.bind_names(names)?;
        }
        Ok(())
    }
}

impl AsRef<str> for Assembly {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : head stage : {} - tail stage: {}", self.name, self.head, self.tail)
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("name", &self.name)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("scope", &self.scope)
            .field("every_applied", &self.every_applied)
            .finish()
    }
}

/// Block context of a group or join: only aggregation-level calls are allowed
pub struct Aggregation<'a> {
    assembly: &'a mut Assembly,
}

impl Aggregation<'_> {
    pub fn name(&self) -> &str {
        self.assembly.name()
    }

    /// Scope of the grouping as built so far
    pub fn scope(&self) -> &Scope {
        self.assembly.scope()
    }

    pub fn every(&mut self, arguments: impl Into<Fields>, options: EveryOptions) -> AssemblyResult<&mut Self> {
        self.assembly.every(arguments, options)?;
        Ok(self)
    }

    /// Keep the first value of each field per group
    pub fn first<I, S>(&mut self, fields: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = field_names(fields);
        self.assembly
            .make_every(Fields::Names(fields.clone()), Operation::First, Some(fields))?;
        Ok(self)
    }

    pub fn assert_group(&mut self, assertion: Arc<dyn Capability>, options: AssertOptions) -> AssemblyResult<&mut Self> {
        self.assembly.assert_group(assertion, options)?;
        Ok(self)
    }
}
