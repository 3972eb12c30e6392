//! Per-instruction register IO model.
//!
//! A pure function from an instruction to the registers it reads and writes,
//! including implicit flag effects. This table centralises the platform
//! knowledge every analyser relies on; the stack instructions only report
//! their `sp` shape here, their real semantics live in the write analysis.

use lift86_parser::ast::{GenericInst, Inst, MoveArg, Operand, Reg, RegSet};

/// Registers an instruction uses and defines.
#[derive(Debug, Clone, Default)]
pub struct InstIo {
    pub uses: RegSet,
    pub defines: RegSet,
    /// False when the mnemonic is not in the table; such instructions report
    /// empty IO and are reported once as a warning.
    pub known: bool,
}

impl InstIo {
    fn new(uses: RegSet, defines: RegSet) -> Self {
        InstIo {
            uses,
            defines,
            known: true,
        }
    }

    fn empty() -> Self {
        InstIo {
            uses: RegSet::new(),
            defines: RegSet::new(),
            known: true,
        }
    }

    fn unknown() -> Self {
        InstIo {
            uses: RegSet::new(),
            defines: RegSet::new(),
            known: false,
        }
    }
}

const HFLAG_BITS: [Reg; 5] = [Reg::Sf, Reg::Zf, Reg::Af, Reg::Pf, Reg::Cf];

fn set(regs: &[Reg]) -> RegSet {
    regs.iter().copied().collect()
}

/// Compute `(uses, defines)` for an instruction.
pub fn instruction_io(inst: &Inst) -> InstIo {
    match inst {
        Inst::Move(m) => {
            let mut uses = move_arg_regs(&m.src);
            if let MoveArg::Mem(mem) = &m.dst {
                uses.extend(mem.base);
                uses.extend(mem.index);
            }
            let defines = match m.dst {
                MoveArg::Reg(r) => set(&[r]),
                _ => RegSet::new(),
            };
            InstIo::new(uses, defines)
        }
        // Control transfer is handled specially by the analyses.
        Inst::Jump(_) => InstIo::empty(),
        Inst::CondJump(c) => InstIo::new(set(c.cond.uses()), RegSet::new()),
        Inst::Generic(g) => generic_io(g),
    }
}

fn generic_io(g: &GenericInst) -> InstIo {
    let regs_of = |i: usize| -> RegSet {
        g.operands
            .get(i)
            .map(|op| op.registers())
            .unwrap_or_default()
    };
    let dst_reg = g.operands.first().and_then(Operand::as_register);
    let dst_set = || dst_reg.map(|r| set(&[r])).unwrap_or_default();
    let same_reg_operands = || {
        matches!(
            (g.operands.first(), g.operands.get(1)),
            (Some(Operand::Register(a)), Some(Operand::Register(b))) if a == b
        )
    };

    match g.mnemonic.as_str() {
        "add" | "sub" | "and" | "or" | "xor" | "adc" | "sbb" => {
            if g.mnemonic == "xor" && same_reg_operands() {
                // xor r,r zeroes the destination without reading it.
                let mut defines = dst_set();
                defines.insert(Reg::Flags);
                return InstIo::new(RegSet::new(), defines);
            }
            if (g.mnemonic == "and" || g.mnemonic == "or") && same_reg_operands() {
                // and a,a / or a,a only sample the value into flags.
                return InstIo::new(regs_of(0), set(&[Reg::Flags]));
            }
            let mut uses = regs_of(0);
            uses.extend(regs_of(1));
            if matches!(g.mnemonic.as_str(), "adc" | "sbb") {
                uses.insert(Reg::Cf);
            }
            let mut defines = dst_set();
            defines.insert(Reg::Flags);
            InstIo::new(uses, defines)
        }
        "neg" => {
            let mut defines = dst_set();
            defines.insert(Reg::Flags);
            InstIo::new(regs_of(0), defines)
        }
        "cmp" | "test" => {
            let mut uses = regs_of(0);
            uses.extend(regs_of(1));
            InstIo::new(uses, set(&[Reg::Flags]))
        }
        "not" => InstIo::new(regs_of(0), dst_set()),
        "inc" | "dec" => {
            let mut defines = dst_set();
            defines.extend([Reg::Of, Reg::Sf, Reg::Zf, Reg::Af, Reg::Pf]);
            InstIo::new(regs_of(0), defines)
        }
        "mul" | "div" => {
            let wide = dst_reg.map(Reg::is_wide).unwrap_or(true);
            let mut uses = regs_of(0);
            let mut defines;
            if wide {
                uses.insert(Reg::Ax);
                if g.mnemonic == "div" {
                    uses.insert(Reg::Dx);
                }
                defines = set(&[Reg::Ax, Reg::Dx]);
            } else {
                uses.insert(Reg::Al);
                if g.mnemonic == "div" {
                    uses.insert(Reg::Ah);
                }
                defines = set(&[Reg::Al, Reg::Ah]);
            }
            defines.insert(Reg::Flags);
            InstIo::new(uses, defines)
        }
        "aam" => InstIo::new(set(&[Reg::Al]), set(&[Reg::Al, Reg::Ah, Reg::Flags])),
        "lahf" => InstIo::new(set(&HFLAG_BITS), set(&[Reg::Ah])),
        "sahf" => InstIo::new(set(&[Reg::Ah]), set(&HFLAG_BITS)),
        "lodb" => InstIo::new(set(&[Reg::Si]), set(&[Reg::Al])),
        "lodw" => InstIo::new(set(&[Reg::Si]), set(&[Reg::Ax])),
        "stob" => InstIo::new(set(&[Reg::Al, Reg::Di]), RegSet::new()),
        "stow" => InstIo::new(set(&[Reg::Ax, Reg::Di]), RegSet::new()),
        "movb" | "movw" => InstIo::new(set(&[Reg::Si, Reg::Di]), RegSet::new()),
        "cmpb" | "scab" => InstIo::new(set(&[Reg::Si, Reg::Di, Reg::Al]), set(&[Reg::Flags])),
        "rcl" | "rcr" => {
            let mut uses = regs_of(0);
            uses.extend(regs_of(1));
            uses.insert(Reg::Cf);
            let mut defines = dst_set();
            defines.extend([Reg::Cf, Reg::Of]);
            InstIo::new(uses, defines)
        }
        "rol" | "ror" => {
            let mut uses = regs_of(0);
            uses.extend(regs_of(1));
            let mut defines = dst_set();
            defines.extend([Reg::Cf, Reg::Of]);
            InstIo::new(uses, defines)
        }
        "shl" | "shr" | "sal" | "sar" => {
            let mut uses = regs_of(0);
            uses.extend(regs_of(1));
            let mut defines = dst_set();
            defines.insert(Reg::Flags);
            InstIo::new(uses, defines)
        }
        "push" => {
            let mut uses = regs_of(0);
            uses.insert(Reg::Sp);
            InstIo::new(uses, set(&[Reg::Sp]))
        }
        "pop" => {
            let mut defines = dst_set();
            defines.insert(Reg::Sp);
            InstIo::new(set(&[Reg::Sp]), defines)
        }
        "ret" => InstIo::new(set(&[Reg::Sp]), set(&[Reg::Sp])),
        "xchg" => {
            let mut touched = dst_set();
            touched.extend(g.operands.get(1).and_then(Operand::as_register));
            InstIo::new(touched.clone(), touched)
        }
        "mov" => {
            // Unstructured mov: a shape the post-pass rejected.
            let mut uses = regs_of(1);
            if dst_reg.is_none() {
                uses.extend(regs_of(0));
            }
            InstIo::new(uses, dst_set())
        }
        "clc" | "stc" => InstIo::new(RegSet::new(), set(&[Reg::Cf])),
        "cmc" => InstIo::new(set(&[Reg::Cf]), set(&[Reg::Cf])),
        "cld" | "std" => InstIo::new(RegSet::new(), set(&[Reg::Df])),
        "cli" | "sti" => InstIo::new(RegSet::new(), set(&[Reg::If])),
        // Control transfer and the repeat prefixes report nothing here.
        "jmp" | "call" | "int" | "nop" | "rep" | "repe" | "repne" | "repz" | "repnz" => {
            InstIo::empty()
        }
        // Declarations.
        "db" | "dw" | "ds" | "dm" | "equ" | "org" | "align" | "put" => InstIo::empty(),
        mnemonic => match lift86_parser::ast::Condition::from_mnemonic(mnemonic) {
            // A conditional jump the post-pass left generic.
            Some(cond) => InstIo::new(set(cond.uses()), RegSet::new()),
            None => InstIo::unknown(),
        },
    }
}

fn move_arg_regs(arg: &MoveArg) -> RegSet {
    match arg {
        MoveArg::Reg(r) => set(&[*r]),
        MoveArg::Mem(mem) => {
            let mut out = RegSet::new();
            out.extend(mem.base);
            out.extend(mem.index);
            out
        }
        MoveArg::Imm(op) => op.registers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift86_parser::ast::Radix;

    fn generic(mnemonic: &str, operands: &[Operand]) -> Inst {
        Inst::Generic(GenericInst {
            mnemonic: mnemonic.to_string(),
            operands: operands.iter().cloned().collect(),
        })
    }

    fn reg(r: Reg) -> Operand {
        Operand::Register(r)
    }

    #[test]
    fn add_defines_destination_and_flags() {
        let io = instruction_io(&generic("add", &[reg(Reg::Ax), reg(Reg::Bx)]));
        assert_eq!(io.uses, set(&[Reg::Ax, Reg::Bx]));
        assert_eq!(io.defines, set(&[Reg::Ax, Reg::Flags]));
    }

    #[test]
    fn xor_self_clears_without_reading() {
        let io = instruction_io(&generic("xor", &[reg(Reg::Ax), reg(Reg::Ax)]));
        assert!(io.uses.is_empty());
        assert_eq!(io.defines, set(&[Reg::Ax, Reg::Flags]));
    }

    #[test]
    fn or_self_only_samples_flags() {
        let io = instruction_io(&generic("or", &[reg(Reg::Al), reg(Reg::Al)]));
        assert_eq!(io.uses, set(&[Reg::Al]));
        assert_eq!(io.defines, set(&[Reg::Flags]));
    }

    #[test]
    fn adc_reads_the_carry() {
        let io = instruction_io(&generic("adc", &[reg(Reg::Ax), reg(Reg::Bx)]));
        assert!(io.uses.contains(&Reg::Cf));
    }

    #[test]
    fn inc_spares_the_carry() {
        let io = instruction_io(&generic("inc", &[reg(Reg::Si)]));
        assert!(io.defines.contains(&Reg::Zf));
        assert!(!io.defines.contains(&Reg::Cf));
        assert!(!io.defines.contains(&Reg::Flags));
    }

    #[test]
    fn div_width_follows_the_operand() {
        let io = instruction_io(&generic("div", &[reg(Reg::Bx)]));
        assert_eq!(io.uses, set(&[Reg::Ax, Reg::Dx, Reg::Bx]));
        assert_eq!(io.defines, set(&[Reg::Ax, Reg::Dx, Reg::Flags]));

        let io = instruction_io(&generic("div", &[reg(Reg::Bl)]));
        assert_eq!(io.uses, set(&[Reg::Al, Reg::Ah, Reg::Bl]));
        assert_eq!(io.defines, set(&[Reg::Al, Reg::Ah, Reg::Flags]));
    }

    #[test]
    fn rotates_through_carry_read_it() {
        let rcl = instruction_io(&generic(
            "rcl",
            &[
                reg(Reg::Ax),
                Operand::Number {
                    value: 1,
                    radix: Radix::Dec,
                },
            ],
        ));
        assert!(rcl.uses.contains(&Reg::Cf));

        let rol = instruction_io(&generic(
            "rol",
            &[
                reg(Reg::Ax),
                Operand::Number {
                    value: 1,
                    radix: Radix::Dec,
                },
            ],
        ));
        assert!(!rol.uses.contains(&Reg::Cf));
        assert!(rol.defines.contains(&Reg::Cf));
    }

    #[test]
    fn push_and_pop_report_their_sp_shape() {
        let push = instruction_io(&generic("push", &[reg(Reg::Bx)]));
        assert_eq!(push.uses, set(&[Reg::Sp, Reg::Bx]));
        assert_eq!(push.defines, set(&[Reg::Sp]));

        let pop = instruction_io(&generic("pop", &[reg(Reg::Bx)]));
        assert_eq!(pop.uses, set(&[Reg::Sp]));
        assert_eq!(pop.defines, set(&[Reg::Sp, Reg::Bx]));
    }

    #[test]
    fn conditional_jump_uses_its_flag_bits() {
        let io = instruction_io(&generic("jle", &[Operand::Symbol("l".into())]));
        assert_eq!(io.uses, set(&[Reg::Of, Reg::Sf, Reg::Zf]));
        let io = instruction_io(&generic("jz", &[Operand::Symbol("l".into())]));
        assert_eq!(io.uses, set(&[Reg::Zf]));
    }

    #[test]
    fn unknown_mnemonic_reports_empty_io() {
        let io = instruction_io(&generic("frobnicate", &[]));
        assert!(!io.known);
        assert!(io.uses.is_empty() && io.defines.is_empty());
    }

    #[test]
    fn declarations_are_silent() {
        let io = instruction_io(&generic("dw", &[reg(Reg::Ax)]));
        assert!(io.known);
        assert!(io.uses.is_empty() && io.defines.is_empty());
    }
}
