// Copyright 2017 The Australian National University
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use mu::ast::cfg::*;
use mu::ast::ir::*;
use mu::compiler::backend::inst_sel::SpillTransfer;
use mu::compiler::backend::x86_64;
use mu::compiler::backend::CallConvention;
use mu::compiler::frame::Frame;
use mu::compiler::*;
use mu::error::RegAllocError;
use mu::options::{self, CompilerOptions};
use mu::testutil::*;

use mu::ast::ir::HardwareRegister::*;

/// a straight line of vertices, one per tree, ending in a final vertex
fn chain(name: &str, trees: Vec<MockTree>) -> CFGFragment<MockTree> {
    let n = trees.len();
    let vertices = trees
        .into_iter()
        .enumerate()
        .map(|(i, tree)| {
            if i + 1 == n {
                (i, CFGVertex::Final(tree))
            } else {
                (i, CFGVertex::Jump(tree, CFGLabel(i + 1)))
            }
        })
        .collect();
    cfg_of(name, vertices, 0)
}

fn def(reg: Register) -> MockTree {
    op("def", &[], &[reg])
}

fn use_all(regs: &[Register]) -> MockTree {
    op("use", regs, &[])
}

/// every register of the code has a hardware register
fn check_complete(func: &CompiledFunction) {
    assert!(func.allocation.is_spill_free());
    for inst in func.code.instructions() {
        for reg in inst.registers_read().iter().chain(inst.registers_written().iter()) {
            assert!(func.allocation.get(reg).is_some(), "{} in '{}' has no register", reg, inst);
        }
    }
}

#[test]
fn test_spill_free_function() {
    options::start_logging_trace();

    let a = Register::new_virtual();
    let b = Register::new_virtual();
    let cfg = chain(
        "spill_free",
        vec![def(a), op("add", &[a], &[b]), use_all(&[a, b])]
    );

    let compiler = Compiler::new(CompilerOptions::default()).unwrap();
    let mut frame = Frame::new();
    let func = compiler.compile_function(&cfg, &MockCovering, &mut frame).unwrap();

    debug!("{}", func.code);
    assert_eq!(func.name, "spill_free");
    assert_eq!(func.code.n_blocks(), 3);
    assert_eq!(count_jumps(&func.code), 0);
    assert!(func.spill_slots.is_empty());
    assert!(frame.allocated.is_empty());
    check_complete(&func);
    assert!(func.allocation.get(&a) != func.allocation.get(&b));
    // caller saved registers come first
    for reg in [a, b].iter() {
        let hw = func.allocation.get(reg).unwrap();
        assert!(x86_64::CALLER_SAVED_GPRs.contains(&hw));
    }
}

#[test]
fn test_copy_coalesced() {
    let a = Register::new_virtual();
    let b = Register::new_virtual();
    let trees = || vec![def(a), copy(b, a), use_all(&[a, b])];

    let compiler = Compiler::new(CompilerOptions::default()).unwrap();
    let func = compiler
        .compile_function(&chain("copy", trees()), &MockCovering, &mut Frame::new())
        .unwrap();
    check_complete(&func);
    assert_eq!(func.allocation.get(&a), func.allocation.get(&b));

    let options = CompilerOptions::init("--disable-coalescing").unwrap();
    let compiler = Compiler::new(options).unwrap();
    let func = compiler
        .compile_function(&chain("copy", trees()), &MockCovering, &mut Frame::new())
        .unwrap();
    check_complete(&func);
}

#[test]
fn test_reference_kept_out_of_preserved_registers() {
    // ten values live at once: more than the caller saved registers
    let reference = Register::new_reference();
    let mut values = vec![reference];
    for _ in 0..9 {
        values.push(Register::new_virtual());
    }
    let mut trees: Vec<MockTree> = values.iter().map(|reg| def(*reg)).collect();
    trees.push(use_all(&values));

    let compiler = Compiler::new(CompilerOptions::default()).unwrap();
    let func = compiler
        .compile_function(&chain("refs", trees), &MockCovering, &mut Frame::new())
        .unwrap();

    check_complete(&func);
    assert!(func.spill_slots.is_empty());
    let hw = func.allocation.get(&reference).unwrap();
    assert!(!x86_64::PRESERVED_GPRs.contains(&hw), "reference placed in {}", hw);

    let mut used: Vec<HardwareRegister> = values.iter().filter_map(|reg| func.allocation.get(reg)).collect();
    used.sort();
    used.dedup();
    assert_eq!(used.len(), 10);
}

#[test]
fn test_frame_registers_used_by_code() {
    let a = Register::new_virtual();
    let b = Register::new_virtual();
    let rsp = Register::Fixed(RSP);
    let rbp = Register::Fixed(RBP);
    let cfg = chain(
        "frame",
        vec![
            op("load", &[rbp], &[a]),
            op("push", &[a, rsp], &[rsp]),
            op("add", &[a], &[b]),
            use_all(&[a, b, rsp]),
        ]
    );

    let compiler = Compiler::new(CompilerOptions::default()).unwrap();
    let func = compiler.compile_function(&cfg, &MockCovering, &mut Frame::new()).unwrap();

    check_complete(&func);
    assert_eq!(func.allocation.get(&rsp), Some(RSP));
    assert_eq!(func.allocation.get(&rbp), Some(RBP));
    for reg in [a, b].iter() {
        let hw = func.allocation.get(reg).unwrap();
        assert!(!x86_64::FRAME_GPRs.contains(&hw), "{} placed in {}", reg, hw);
    }
}

/// six values live at once, used in pairs afterwards
fn six_values(name: &str) -> (CFGFragment<MockTree>, Vec<Register>) {
    let regs: Vec<Register> = (0..6).map(|_| Register::new_virtual()).collect();
    let mut trees: Vec<MockTree> = regs.iter().map(|reg| def(*reg)).collect();
    for pair in regs.chunks(2) {
        trees.push(use_all(pair));
    }
    (chain(name, trees), regs)
}

fn five_register_convention() -> CallConvention {
    CallConvention::new(vec![RAX, RCX, RDX, R10, R11], vec![], vec![R10, R11], vec![]).unwrap()
}

fn check_spill_rewrite(func: &CompiledFunction, regs: &[Register], frame: &Frame) {
    check_complete(func);

    // the retry colors six values with three registers
    assert_eq!(func.spill_slots.len(), 3);
    assert_eq!(frame.allocated.len(), 3);

    let mut loads = 0;
    let mut stores = 0;
    for inst in func.code.instructions() {
        if let Some(transfer) = as_spill(inst) {
            let hw = transfer.register().as_fixed().unwrap();
            assert!(hw == R10 || hw == R11, "{} goes through {}", transfer, hw);
            match *transfer {
                SpillTransfer::Load { .. } => loads += 1,
                SpillTransfer::Store { .. } => stores += 1
            }
        }
        for reg in inst.registers_read().iter().chain(inst.registers_written().iter()) {
            assert!(!func.spill_slots.contains_key(reg), "'{}' still uses {}", inst, reg);
        }
    }
    // every spilled value is defined once and used once
    assert_eq!(loads, 3);
    assert_eq!(stores, 3);

    for reg in regs.iter() {
        if !func.spill_slots.contains_key(reg) {
            let hw = func.allocation.get(reg).unwrap();
            assert!(hw != R10 && hw != R11);
        }
    }
}

#[test]
fn test_spill_rewrite() {
    options::start_logging_trace();

    let (cfg, regs) = six_values("spill");
    let compiler = Compiler::with_call_convention(CompilerOptions::default(), five_register_convention());

    let mut frame = Frame::new();
    let func = compiler.compile_function(&cfg, &MockCovering, &mut frame).unwrap();

    debug!("{}", func.code);
    debug!("{}", func.allocation);
    check_spill_rewrite(&func, &regs, &frame);
}

#[test]
fn test_spill_rewrite_without_validation() {
    let (cfg, regs) = six_values("spill_unchecked");
    let options = CompilerOptions::init("--disable-regalloc-validate").unwrap();
    let compiler = Compiler::with_call_convention(options, five_register_convention());

    let mut frame = Frame::new();
    let func = compiler.compile_function(&cfg, &MockCovering, &mut frame).unwrap();

    check_spill_rewrite(&func, &regs, &frame);
}

#[test]
fn test_too_few_backups() {
    // one instruction reads three spilled values, with two backups to load them into
    let regs: Vec<Register> = (0..6).map(|_| Register::new_virtual()).collect();
    let mut trees: Vec<MockTree> = regs.iter().map(|reg| def(*reg)).collect();
    trees.push(use_all(&regs));
    let compiler = Compiler::with_call_convention(CompilerOptions::default(), five_register_convention());

    match compiler.compile_function(&chain("crowded", trees), &MockCovering, &mut Frame::new()) {
        Err(RegAllocError::SpillHandling(_)) => {}
        Err(e) => panic!("expected a spill handling error, got {:?}", e),
        Ok(func) => panic!("expected a spill handling error, got\n{}", func.code)
    }
}

#[test]
fn test_invalid_options() {
    // rsp is always live, so it cannot be a backup
    let options = CompilerOptions::init("--backup-regs=rsp").unwrap();
    match Compiler::new(options) {
        Err(RegAllocError::InvalidOptions(_)) => {}
        Err(e) => panic!("expected invalid options, got {:?}", e),
        Ok(_) => panic!("expected invalid options")
    }

    match CallConvention::new(vec![RAX, RCX], vec![RCX], vec![RCX], vec![]) {
        Err(RegAllocError::InvalidOptions(_)) => {}
        other => panic!("expected invalid options, got {:?}", other)
    }

    match CallConvention::new(vec![RAX, RCX], vec![], vec![RCX], vec![RSP]) {
        Err(RegAllocError::InvalidOptions(_)) => {}
        other => panic!("expected invalid options, got {:?}", other)
    }
}
