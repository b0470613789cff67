/// Schema propagation properties checked after every kind of DSL call
use dataflow_assembly::plan::OutputSelector;
use dataflow_assembly::schema::find_duplicates;
use dataflow_assembly::{
    AssemblyError, AssertOptions, CopyOptions, EachOptions, Flow, GroupByOptions, JoinOptions, NamedCapability,
    Operation, Scope, StageOperator,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn names(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn assert_unique(scope: &Scope) {
    assert!(
        find_duplicates(scope.fields()).is_empty(),
        "duplicate fields in {}",
        scope
    );
}

#[test]
fn test_fields_stay_unique_across_row_operations() {
    init_tracing();
    println!("\n🧪 Testing field uniqueness after every row-wise call");

    let mut flow = Flow::new("uniqueness");
    flow.source_with_key("people", ["id", "name", "age"], ["id"]).unwrap();
    flow.assembly("people", |a| {
        assert_unique(a.scope());
        a.pass()?;
        assert_unique(a.scope());
        a.each(
            ["name"],
            EachOptions::function(NamedCapability::new("upper")).output(["id", "name", "age", "shout"]),
        )?;
        assert_unique(a.scope());
        a.copy(CopyOptions::new(["age"]).into_fields(["age_copy"]))?;
        assert_unique(a.scope());
        a.cast([("age", "int")])?;
        assert_unique(a.scope());
        a.rename([("shout", "loud")])?;
        assert_unique(a.scope());
        a.discard(["age_copy"])?;
        assert_unique(a.scope());
        a.bind_names(["pid", "pname", "page", "ploud"])?;
        assert_unique(a.scope());
        a.assert(NamedCapability::new("not_null"), AssertOptions::default())?;
        assert_unique(a.scope());
        a.project(["pid", "ploud"])?;
        assert_unique(a.scope());
        Ok(())
    })
    .unwrap();

    let plan = flow.finish();
    assert_eq!(plan.scope("people").unwrap().fields(), &names(&["pid", "ploud"])[..]);
    assert_eq!(plan.scope("people").unwrap().primary_key(), Some(&names(&["pid"])[..]));
}

#[test]
fn test_project_then_discard_matches_smaller_project() {
    let mut flow = Flow::new("project_discard");
    flow.source("in", ["a", "b", "c"]).unwrap();
    flow.assembly("in", |a| {
        a.branch("two_steps", |b| {
            b.project(["a", "b"])?.discard(["b"])?;
            Ok(())
        })?;
        a.branch("one_step", |b| {
            b.project(["a"])?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    let plan = flow.finish();
    assert_eq!(plan.scope("two_steps").unwrap().fields(), plan.scope("one_step").unwrap().fields());
    assert_eq!(plan.scope("one_step").unwrap().fields(), &names(&["a"])[..]);
}

#[test]
fn test_rename_round_trip_restores_fields_and_key() {
    let mut flow = Flow::new("rename");
    flow.source_with_key("in", ["x", "a"], ["x"]).unwrap();
    flow.assembly("in", |a| {
        let before = a.scope().clone();
        a.rename([("x", "y")])?;
        assert_eq!(a.scope().fields(), &names(&["y", "a"])[..]);
        assert_eq!(a.scope().primary_key(), Some(&names(&["y"])[..]));
        a.rename([("y", "x")])?;
        assert_eq!(a.scope().fields(), before.fields());
        assert_eq!(a.scope().primary_key(), before.primary_key());
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_rename_unknown_field_names_it() {
    let mut flow = Flow::new("rename_invalid");
    flow.source("in", ["x", "a"]).unwrap();
    let err = flow
        .assembly("in", |a| {
            a.rename([("zzz", "q")])?;
            Ok(())
        })
        .unwrap_err();

    match err {
        AssemblyError::InvalidFieldReference { fields, operation, .. } => {
            assert_eq!(fields, names(&["zzz"]));
            assert_eq!(operation, "rename");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_project_unknown_field_fails() {
    let mut flow = Flow::new("project_invalid");
    flow.source("in", ["a"]).unwrap();
    let err = flow
        .assembly("in", |a| {
            a.project(["a", "missing"])?;
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err.offending_names(), names(&["missing"]));
}

#[test]
fn test_each_arguments_must_come_from_upstream() {
    let mut flow = Flow::new("each_invalid");
    flow.source("in", ["a"]).unwrap();
    let err = flow
        .assembly("in", |a| {
            a.each(["b"], EachOptions::filter(NamedCapability::new("positive")))?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, AssemblyError::SchemaPrecondition { .. }));
    assert_eq!(err.offending_names(), names(&["b"]));
}

#[test]
fn test_filter_keeps_fields() {
    let mut flow = Flow::new("filter");
    flow.source("in", ["a", "b"]).unwrap();
    flow.assembly("in", |a| {
        a.each(["a"], EachOptions::filter(NamedCapability::new("positive")))?;
        assert_eq!(a.scope().fields(), &names(&["a", "b"])[..]);
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_cast_retypes_in_place() {
    let mut flow = Flow::new("cast");
    flow.source("in", ["id", "price", "label"]).unwrap();
    flow.assembly("in", |a| {
        a.cast([("price", "double"), ("id", "long")])?;
        Ok(())
    })
    .unwrap();

    let plan = flow.finish();
    assert_eq!(plan.scope("in").unwrap().fields(), &names(&["id", "price", "label"])[..]);
    let stage = plan.graph.get(plan.tail("in").unwrap()).unwrap();
    match &stage.operator {
        StageOperator::Each {
            arguments,
            operation: Operation::Identity { rename, types },
            output,
            ..
        } => {
            assert_eq!(arguments.as_names(), Some(&names(&["id", "price"])[..]));
            assert!(rename.is_none());
            assert_eq!(
                types.as_deref(),
                Some(&[arrow::datatypes::DataType::Int64, arrow::datatypes::DataType::Float64][..])
            );
            assert_eq!(*output, OutputSelector::Replace);
        }
        other => panic!("unexpected stage: {other:?}"),
    }
}

#[test]
fn test_cast_unknown_type_or_field() {
    let mut flow = Flow::new("cast_invalid");
    flow.source("in", ["id"]).unwrap();
    let err = flow
        .assembly("in", |a| {
            a.cast([("id", "decimal")])?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, AssemblyError::UnknownType { .. }));

    let err = flow
        .assembly("in", |a| {
            a.cast([("nope", "int")])?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, AssemblyError::InvalidFieldReference { .. }));
}

#[test]
fn test_copy_is_additive() {
    let mut flow = Flow::new("copy");
    flow.source("in", ["a", "b"]).unwrap();
    flow.assembly("in", |a| {
        a.copy(CopyOptions::new(["a"]).into_fields(["a2"]))?;
        assert_eq!(a.scope().fields(), &names(&["a", "b", "a2"])[..]);
        a.copy(CopyOptions::new(["b"]))?;
        assert_eq!(a.scope().fields(), &names(&["a", "b", "a2"])[..]);
        Ok(())
    })
    .unwrap();

    let err = flow
        .assembly("in", |a| {
            a.copy(CopyOptions::new(["a"]).into_fields(["b"]))?;
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err.offending_names(), names(&["b"]));
}

#[test]
fn test_bind_names_is_positional() {
    let mut flow = Flow::new("bind");
    flow.source_with_key("in", ["a", "b"], ["b"]).unwrap();
    flow.assembly("in", |a| {
        a.bind_names(["x", "y"])?;
        assert_eq!(a.scope().fields(), &names(&["x", "y"])[..]);
        assert_eq!(a.scope().primary_key(), Some(&names(&["y"])[..]));
        assert!(a.bind_names(["only_one"]).is_err());
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_primary_declares_and_clears() {
    let mut flow = Flow::new("primary");
    flow.source("in", ["a", "b"]).unwrap();
    flow.assembly("in", |a| {
        let stages_before = a.tail();
        a.primary(["a"])?;
        assert_eq!(a.scope().primary_key(), Some(&names(&["a"])[..]));
        assert_eq!(a.tail(), stages_before);
        a.clear_primary()?;
        assert!(a.scope().primary_key().is_none());
        let err = a.primary(["zzz"]).unwrap_err();
        assert_eq!(err.offending_names(), names(&["zzz"]));
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_branch_forks_from_parent_tail() {
    let mut flow = Flow::new("branches");
    flow.source("in", ["id", "v"]).unwrap();
    let mut fork_point = None;
    flow.assembly("in", |a| {
        a.pass()?;
        fork_point = Some(a.tail());
        a.branch("child", |b| {
            assert_eq!(b.scope().name, "child");
            assert_eq!(b.scope().fields(), &names(&["id", "v"])[..]);
            b.project(["id"])?;
            Ok(())
        })?;
        a.discard(["id"])?;
        Ok(())
    })
    .unwrap();

    let plan = flow.finish();
    assert_eq!(plan.scope("child").unwrap().fields(), &names(&["id"])[..]);
    assert_eq!(plan.scope("in").unwrap().fields(), &names(&["v"])[..]);

    let fork_point = fork_point.unwrap();
    let downstream = plan.graph.downstream_of(fork_point);
    assert_eq!(downstream.len(), 2, "fork point feeds the child head and the parent's next stage");
    let child_head = plan
        .graph
        .iter()
        .find(|s| s.name == "child" && matches!(s.operator, StageOperator::Head { .. }))
        .unwrap();
    assert_eq!(child_head.upstreams(), vec![fork_point]);
}

#[test]
fn test_root_without_source_starts_empty() {
    let mut flow = Flow::new("empty");
    flow.assembly("nothing", |a| {
        assert!(a.scope().fields().is_empty());
        assert!(a.scope().primary_key().is_none());
        Ok(())
    })
    .unwrap();
    assert!(flow.scope_of("nothing").unwrap().fields().is_empty());
}

#[test]
fn test_plan_exports_json() {
    let mut flow = Flow::new("export");
    flow.source("in", ["a"]).unwrap();
    flow.assembly("in", |a| {
        a.each(["a"], EachOptions::function(NamedCapability::new("double")).output(["b"]))?;
        Ok(())
    })
    .unwrap();
    let json = flow.finish().to_json().unwrap();
    assert!(json.contains("\"double\""));
    assert!(json.contains("\"each\""));
}

#[test]
fn test_failed_assembly_leaves_graph_unchanged() {
    init_tracing();
    println!("\n🧪 Testing that failed builds discard their stages");

    let kept_flow = || {
        let mut flow = Flow::new("rollback");
        flow.source("in", ["k", "v"]).unwrap();
        flow.assembly("kept", |a| {
            a.pass()?;
            Ok(())
        })
        .unwrap();
        flow
    };
    let before = kept_flow().finish();

    let mut flow = kept_flow();
    assert!(flow
        .assembly("in", |a| {
            a.pass()?;
            a.group_by(["zzz"], GroupByOptions::default())?;
            Ok(())
        })
        .is_err());
    assert!(flow
        .assembly("j", |a| {
            a.join(JoinOptions::on(["kept", "nope"], ["k"]))?;
            Ok(())
        })
        .is_err());

    let after = flow.finish();
    assert_eq!(after.graph.len(), before.graph.len());
    assert_eq!(after.graph.tails(), before.graph.tails());
    assert_eq!(after.branches.keys().collect::<Vec<_>>(), vec!["kept"]);
}

#[test]
fn test_failed_branch_is_discarded_with_its_children() {
    let mut flow = Flow::new("branch_rollback");
    flow.source("in", ["k", "v"]).unwrap();
    let mut len_before_branch = 0;
    flow.assembly("in", |a| {
        a.pass()?;
        let tail = a.tail();
        len_before_branch = tail.0 + 1;
        let result = a.branch("broken", |b| {
            b.branch("inner", |c| {
                c.project(["k"])?;
                Ok(())
            })?;
            b.project(["missing"])?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(a.tail(), tail);
        a.discard(["v"])?;
        Ok(())
    })
    .unwrap();

    let plan = flow.finish();
    assert_eq!(plan.graph.len(), len_before_branch + 1);
    assert_eq!(plan.graph.tails(), vec![plan.tail("in").unwrap()]);
    assert!(plan.scope("broken").is_none());
    assert!(plan.scope("inner").is_none());
    assert_eq!(plan.scope("in").unwrap().fields(), &names(&["k"])[..]);
}
