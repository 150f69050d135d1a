//! Integration tests for procedure definition, calling-convention
//! compilation, and call-site lowering.
//!
//! These exercise the full flow: bind a host-authored body, invoke it with
//! concrete arguments, and lower both the call site and the lazily compiled
//! declaration.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use rustc_hash::FxHashMap;
use stackscript::prelude::*;

/// A two-value-parameter `add` procedure returning `a + b`.
fn add_procedure() -> Procedure {
    ProcedureBuilder::new("add", StackType::Uint64)
        .value_param("a")
        .value_param("b")
        .build(|params| BinaryExpr::add(params[0].expr(), params[1].expr()))
        .expect("add procedure builds")
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_ids_unique_and_strictly_increasing() {
    let defs: Vec<_> = (0..8).map(|_| add_procedure()).collect();
    for pair in defs.windows(2) {
        assert!(pair[0].definition().id() < pair[1].definition().id());
    }
}

#[test]
fn test_definitions_work_as_map_keys() {
    let a = add_procedure();
    let b = add_procedure();

    let mut collected: FxHashMap<Arc<ProcedureDefinition>, usize> = FxHashMap::default();
    collected.insert(a.definition().clone(), 0);
    collected.insert(b.definition().clone(), 1);
    // Re-inserting the same definition overwrites, not duplicates.
    collected.insert(a.definition().clone(), 2);

    assert_eq!(collected.len(), 2);
    assert_eq!(collected.get(a.definition()), Some(&2));
    assert_eq!(collected.get(b.definition()), Some(&1));
}

// =============================================================================
// Declaration memoization
// =============================================================================

#[test]
fn test_declaration_cached_and_implementation_runs_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = runs.clone();
    let proc_ = ProcedureBuilder::new("probed", StackType::Uint64)
        .build(move |_| {
            probe.fetch_add(1, Ordering::SeqCst);
            Ok(int(7))
        })
        .unwrap();

    let first = proc_.definition().declaration().unwrap();
    let second = proc_.definition().declaration().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_compilation_is_not_cached() {
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = runs.clone();
    let proc_ = ProcedureBuilder::new("flaky", StackType::Uint64)
        .build(move |_| {
            if probe.fetch_add(1, Ordering::SeqCst) == 0 {
                // An authoring mistake: bytes where an integer is needed.
                BinaryExpr::add(int(1), byte_string(vec![0]))
            } else {
                Ok(int(1))
            }
        })
        .unwrap();

    let err = proc_.definition().declaration().unwrap_err();
    assert!(matches!(err, CompileError::TypeMismatch { .. }));

    // The failure was not cached: the next access re-invokes and succeeds.
    assert!(proc_.definition().declaration().is_ok());
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reentrant_declaration_access_is_rejected() {
    let cell: Arc<OnceLock<Arc<ProcedureDefinition>>> = Arc::new(OnceLock::new());
    let wired = cell.clone();
    let proc_ = ProcedureBuilder::new("reentrant", StackType::Uint64)
        .build(move |_| {
            let definition = wired.get().expect("definition wired before compilation");
            definition.declaration()?;
            Ok(int(1))
        })
        .unwrap();
    cell.set(proc_.definition().clone()).unwrap();

    let err = proc_.definition().declaration().unwrap_err();
    assert_eq!(
        err,
        CompileError::DeclarationInProgress {
            name: "reentrant".to_string(),
        }
    );
}

#[test]
fn test_recursive_calls_compile() {
    // A body may call its own definition: `invoke` never compiles, so the
    // in-progress declaration is not needed.
    let cell: Arc<OnceLock<Arc<ProcedureDefinition>>> = Arc::new(OnceLock::new());
    let wired = cell.clone();
    let proc_ = ProcedureBuilder::new("countdown", StackType::Uint64)
        .value_param("n")
        .build(move |params| {
            let definition = wired.get().expect("definition wired before compilation");
            let again = definition.invoke(vec![Arg::Value(params[0].expr())])?;
            BinaryExpr::add(again.into_expr(), int(1))
        })
        .unwrap();
    cell.set(proc_.definition().clone()).unwrap();

    let declaration = proc_.definition().declaration().unwrap();
    let block = declaration.lower(&CompileContext::default()).unwrap();
    let own_id = proc_.definition().id();
    assert!(
        block
            .instructions()
            .iter()
            .any(|instruction| *instruction == Instruction::CallProc(own_id))
    );
}

// =============================================================================
// Invocation validation
// =============================================================================

#[test]
fn test_invoke_rejects_every_wrong_arity() {
    let add = add_procedure();
    for count in [0usize, 1, 3, 4, 9] {
        let args: Vec<Arg> = (0..count).map(|i| Arg::Value(int(i as u64))).collect();
        let err = add.call(args).unwrap_err();
        assert_eq!(
            err,
            CompileError::ArgumentCount {
                name: "add".to_string(),
                expected: 2,
                found: count,
            }
        );
    }
}

#[test]
fn test_value_parameter_rejects_reference_argument() {
    let add = add_procedure();
    let var = ScratchVar::new(StackType::Uint64);
    let err = add
        .call(vec![Arg::Reference(var), Arg::Value(int(2))])
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::ArgumentKind {
            name: "add".to_string(),
            index: 0,
            param: "a".to_string(),
            expected: ParamKind::Value,
            found: ParamKind::Reference,
        }
    );
}

#[test]
fn test_reference_parameter_rejects_value_argument() {
    let swap_in = ProcedureBuilder::new("swap_in", StackType::None)
        .reference_param("x")
        .build(|params| params[0].var().store(int(0)))
        .unwrap();
    let err = swap_in.call(vec![Arg::Value(int(1))]).unwrap_err();
    assert_eq!(
        err,
        CompileError::ArgumentKind {
            name: "swap_in".to_string(),
            index: 0,
            param: "x".to_string(),
            expected: ParamKind::Reference,
            found: ParamKind::Value,
        }
    );
}

// =============================================================================
// Calling convention
// =============================================================================

#[test]
fn test_prologue_stores_in_reverse_declaration_order() {
    let slots: Arc<Mutex<Vec<SlotId>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = slots.clone();
    let proc_ = ProcedureBuilder::new("three", StackType::Uint64)
        .reference_param("p0")
        .reference_param("p1")
        .reference_param("p2")
        .build(move |params| {
            let mut seen = captured.lock().unwrap();
            for param in params {
                seen.push(param.var().slot_id());
            }
            Ok(int(1))
        })
        .unwrap();

    let declaration = proc_.definition().declaration().unwrap();
    let block = declaration.lower(&CompileContext::default()).unwrap();
    let seen = slots.lock().unwrap();
    assert_eq!(seen.len(), 3);

    // p2 was pushed last by the caller, so it is popped first.
    assert_eq!(
        &block.instructions()[..3],
        &[
            Instruction::Store(seen[2]),
            Instruction::Store(seen[1]),
            Instruction::Store(seen[0]),
        ]
    );
    assert_eq!(block.instructions()[3], Instruction::PushInt(1));
}

#[test]
fn test_zero_parameter_body_is_the_authored_body_verbatim() {
    let authored = int(99);
    let body = authored.clone();
    let proc_ = ProcedureBuilder::new("constant", StackType::Uint64)
        .build(move |_| Ok(body.clone()))
        .unwrap();

    let declaration = proc_.definition().declaration().unwrap();
    assert!(Arc::ptr_eq(declaration.body(), &authored));

    let ctx = CompileContext::default();
    assert_eq!(
        declaration.lower(&ctx).unwrap(),
        authored.lower(&ctx).unwrap()
    );
}

#[test]
fn test_lowering_a_declaration_is_idempotent() {
    let add = add_procedure();
    let declaration = add.definition().declaration().unwrap();
    let ctx = CompileContext::default();
    assert_eq!(
        declaration.lower(&ctx).unwrap(),
        declaration.lower(&ctx).unwrap()
    );
}

// =============================================================================
// Call-site lowering
// =============================================================================

#[test]
fn test_reference_argument_pushes_slot_index_not_value() {
    let touch = ProcedureBuilder::new("touch", StackType::None)
        .reference_param("x")
        .build(|params| params[0].var().store(int(0)))
        .unwrap();

    let caller_var = ScratchVar::new(StackType::Uint64);
    let call = touch.call(vec![Arg::Reference(caller_var.clone())]).unwrap();
    let block = call.lower(&CompileContext::default()).unwrap();

    assert_eq!(
        block.instructions(),
        &[
            Instruction::PushInt(u64::from(caller_var.slot_id().0)),
            Instruction::CallProc(touch.definition().id()),
        ]
    );
}

#[test]
fn test_version_below_call_minimum_fails_with_zero_instructions() {
    let add = add_procedure();
    let call = add
        .call(vec![Arg::Value(int(1)), Arg::Value(int(2))])
        .unwrap();

    let err = call.lower(&CompileContext::new(3)).unwrap_err();
    assert_eq!(
        err,
        CompileError::VersionTooLow {
            instruction: "callproc".to_string(),
            required: 4,
            target: 3,
        }
    );

    // The same call lowers once the target version supports it.
    assert!(call.lower(&CompileContext::new(4)).is_ok());
}

// =============================================================================
// End to end
// =============================================================================

#[test]
fn test_add_end_to_end() {
    let add = add_procedure();
    let ctx = CompileContext::default();

    let call = add
        .call(vec![Arg::Value(int(1)), Arg::Value(int(2))])
        .unwrap();
    assert_eq!(
        call.lower(&ctx).unwrap().instructions(),
        &[
            Instruction::PushInt(1),
            Instruction::PushInt(2),
            Instruction::CallProc(add.definition().id()),
        ]
    );

    let declaration = add.definition().declaration().unwrap();
    let body = declaration.lower(&ctx).unwrap();
    let instructions = body.instructions();
    assert_eq!(instructions.len(), 5);

    // Prologue: store b, then store a.
    let (slot_b, slot_a) = match (&instructions[0], &instructions[1]) {
        (Instruction::Store(b), Instruction::Store(a)) => (*b, *a),
        other => panic!("expected two prologue stores, found {:?}", other),
    };
    assert!(slot_a < slot_b); // allocated in declaration order

    // Authored body: load a, load b, add.
    assert_eq!(
        &instructions[2..],
        &[
            Instruction::Load(slot_a),
            Instruction::Load(slot_b),
            Instruction::Add,
        ]
    );
}

#[test]
fn test_increment_by_reference_aliases_caller_storage() {
    let param_slot: Arc<Mutex<Option<SlotId>>> = Arc::new(Mutex::new(None));
    let captured = param_slot.clone();
    let increment = ProcedureBuilder::new("increment", StackType::None)
        .reference_param("x")
        .build(move |params| {
            let x = params[0].var();
            *captured.lock().unwrap() = Some(x.slot_id());
            x.store(BinaryExpr::add(x.load(), int(1))?)
        })
        .unwrap();

    let ctx = CompileContext::default();
    let caller_var = ScratchVar::new(StackType::Uint64);
    let caller_slot = caller_var.slot_id();

    // Call site: push the caller's slot index, then call.
    let call = increment.call(vec![Arg::Reference(caller_var)]).unwrap();
    assert_eq!(
        call.lower(&ctx).unwrap().instructions(),
        &[
            Instruction::PushInt(u64::from(caller_slot.0)),
            Instruction::CallProc(increment.definition().id()),
        ]
    );

    let declaration = increment.definition().declaration().unwrap();
    let body = declaration.lower(&ctx).unwrap();
    let local = param_slot.lock().unwrap().expect("binding captured");

    // Prologue stores the received index into the dynamic slot; every later
    // access goes through it.
    assert_eq!(
        body.instructions(),
        &[
            Instruction::Store(local),
            Instruction::Load(local),
            Instruction::Load(local),
            Instruction::LoadIndirect,
            Instruction::PushInt(1),
            Instruction::Add,
            Instruction::StoreIndirect,
        ]
    );

    // The compiled body never names the caller's slot literally.
    for instruction in body.instructions() {
        match instruction {
            Instruction::Load(slot) | Instruction::Store(slot) => {
                assert_ne!(*slot, caller_slot);
            }
            Instruction::PushInt(value) => {
                assert_ne!(*value, u64::from(caller_slot.0));
            }
            _ => {}
        }
    }
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn test_display_forms() {
    let add = add_procedure();
    assert_eq!(
        format!("{}", add.definition()),
        format!("procedure#{}", add.definition().id())
    );

    let call = add
        .call(vec![Arg::Value(int(1)), Arg::Value(int(2))])
        .unwrap();
    assert_eq!(format!("{}", call), "(call \"add\" (int 1) (int 2))");

    let declaration = add.definition().declaration().unwrap();
    assert!(format!("{}", declaration).starts_with("(declaration \"add\""));
}
