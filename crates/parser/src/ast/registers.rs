//! Register names, the sub/super-register relation, and the aliasing algebra
//! shared by all analyses.
//!
//! The four general-purpose 16-bit registers decompose into high/low byte
//! pairs; those pairs are the only *coverings* (super-registers whose bits
//! are exactly the concatenation of their parts). The synthetic `flags` and
//! `hflags` registers group the condition bits as sub-fields but are not
//! coverings, so liveness never collapses individual bits into them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

/// Every register name the analyses reason about, including the synthetic
/// flag groups and the individual condition bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    Al,
    Cl,
    Dl,
    Bl,
    Ah,
    Ch,
    Dh,
    Bh,
    Ax,
    Cx,
    Dx,
    Bx,
    Sp,
    Bp,
    Si,
    Di,
    HFlags,
    Flags,
    Sf,
    Zf,
    Af,
    Pf,
    Cf,
    Of,
    Df,
    If,
    Tf,
}

/// A set of register names. Ordered so that iteration is deterministic.
pub type RegSet = BTreeSet<Reg>;

const MACHINE_REGS: [Reg; 16] = [
    Reg::Al,
    Reg::Cl,
    Reg::Dl,
    Reg::Bl,
    Reg::Ah,
    Reg::Ch,
    Reg::Dh,
    Reg::Bh,
    Reg::Ax,
    Reg::Cx,
    Reg::Dx,
    Reg::Bx,
    Reg::Sp,
    Reg::Bp,
    Reg::Si,
    Reg::Di,
];

const ALL_REGS: [Reg; 27] = [
    Reg::Al,
    Reg::Cl,
    Reg::Dl,
    Reg::Bl,
    Reg::Ah,
    Reg::Ch,
    Reg::Dh,
    Reg::Bh,
    Reg::Ax,
    Reg::Cx,
    Reg::Dx,
    Reg::Bx,
    Reg::Sp,
    Reg::Bp,
    Reg::Si,
    Reg::Di,
    Reg::HFlags,
    Reg::Flags,
    Reg::Sf,
    Reg::Zf,
    Reg::Af,
    Reg::Pf,
    Reg::Cf,
    Reg::Of,
    Reg::Df,
    Reg::If,
    Reg::Tf,
];

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::Al => "al",
            Reg::Cl => "cl",
            Reg::Dl => "dl",
            Reg::Bl => "bl",
            Reg::Ah => "ah",
            Reg::Ch => "ch",
            Reg::Dh => "dh",
            Reg::Bh => "bh",
            Reg::Ax => "ax",
            Reg::Cx => "cx",
            Reg::Dx => "dx",
            Reg::Bx => "bx",
            Reg::Sp => "sp",
            Reg::Bp => "bp",
            Reg::Si => "si",
            Reg::Di => "di",
            Reg::HFlags => "hflags",
            Reg::Flags => "flags",
            Reg::Sf => "sf",
            Reg::Zf => "zf",
            Reg::Af => "af",
            Reg::Pf => "pf",
            Reg::Cf => "cf",
            Reg::Of => "of",
            Reg::Df => "df",
            Reg::If => "if",
            Reg::Tf => "tf",
        }
    }

    /// Look up any register name, synthetic ones included. Case-insensitive.
    pub fn from_name(s: &str) -> Option<Reg> {
        let lower = s.to_ascii_lowercase();
        ALL_REGS.iter().copied().find(|r| r.name() == lower)
    }

    /// Look up a register name as it may appear in a source operand: only the
    /// sixteen machine registers qualify, never the synthetic flag groups.
    pub fn from_operand_name(s: &str) -> Option<Reg> {
        let lower = s.to_ascii_lowercase();
        MACHINE_REGS.iter().copied().find(|r| r.name() == lower)
    }

    /// Declared sub-fields of this register. Empty for leaf registers.
    pub fn sub_regs(self) -> &'static [Reg] {
        match self {
            Reg::Ax => &[Reg::Ah, Reg::Al],
            Reg::Bx => &[Reg::Bh, Reg::Bl],
            Reg::Cx => &[Reg::Ch, Reg::Cl],
            Reg::Dx => &[Reg::Dh, Reg::Dl],
            Reg::HFlags => &[Reg::Sf, Reg::Zf, Reg::Af, Reg::Pf, Reg::Cf],
            Reg::Flags => &[
                Reg::HFlags,
                Reg::Sf,
                Reg::Zf,
                Reg::Af,
                Reg::Pf,
                Reg::Cf,
                Reg::Of,
                Reg::Df,
                Reg::If,
                Reg::Tf,
            ],
            _ => &[],
        }
    }

    /// The (high, low) byte pair of a covering register, if this is one.
    pub fn covering(self) -> Option<(Reg, Reg)> {
        match self {
            Reg::Ax => Some((Reg::Ah, Reg::Al)),
            Reg::Bx => Some((Reg::Bh, Reg::Bl)),
            Reg::Cx => Some((Reg::Ch, Reg::Cl)),
            Reg::Dx => Some((Reg::Dh, Reg::Dl)),
            _ => None,
        }
    }

    /// Every register this one is a sub-field of.
    pub fn super_regs(self) -> &'static [Reg] {
        let table = super_table();
        table.get(&self).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_wide(self) -> bool {
        matches!(
            self,
            Reg::Ax | Reg::Cx | Reg::Dx | Reg::Bx | Reg::Sp | Reg::Bp | Reg::Si | Reg::Di
        )
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Super-register reverse lookup, derived from the sub-register map once at
/// startup.
fn super_table() -> &'static HashMap<Reg, Vec<Reg>> {
    static TABLE: OnceLock<HashMap<Reg, Vec<Reg>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<Reg, Vec<Reg>> = HashMap::new();
        for sup in ALL_REGS {
            for &sub in sup.sub_regs() {
                table.entry(sub).or_default().push(sup);
            }
        }
        for supers in table.values_mut() {
            supers.sort();
            supers.dedup();
        }
        table
    })
}

/// `S ∪ {every sub-field of every member}`, transitively.
pub fn expand_subregs(set: &RegSet) -> RegSet {
    let mut out = set.clone();
    let mut stack: Vec<Reg> = set.iter().copied().collect();
    while let Some(r) = stack.pop() {
        for &sub in r.sub_regs() {
            if out.insert(sub) {
                stack.push(sub);
            }
        }
    }
    out
}

/// Sub-fields plus every super-register of any member: the set of names whose
/// contents become uncertain after a write to any register in `set`.
pub fn expand_aliases(set: &RegSet) -> RegSet {
    let mut out = expand_subregs(set);
    for r in set.iter().copied().collect::<Vec<_>>() {
        for &sup in r.super_regs() {
            out.insert(sup);
        }
    }
    out
}

/// Sub-fields plus any covering register whose parts are all present, so that
/// a live `{ah, al}` is recognised as a live `ax`.
pub fn expand_coverings(set: &RegSet) -> RegSet {
    let mut out = expand_subregs(set);
    for r in ALL_REGS {
        if let Some((hi, lo)) = r.covering() {
            if out.contains(&hi) && out.contains(&lo) {
                out.insert(r);
            }
        }
    }
    out
}

/// Replace every whole-covering register by its parts: the canonical storage
/// form for liveness sets.
pub fn decompose_coverings(set: &RegSet) -> RegSet {
    let mut out = RegSet::new();
    for &r in set {
        match r.covering() {
            Some((hi, lo)) => {
                out.insert(hi);
                out.insert(lo);
            }
            None => {
                out.insert(r);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(regs: &[Reg]) -> RegSet {
        regs.iter().copied().collect()
    }

    #[test]
    fn expands_gpr_subregisters() {
        let out = expand_subregs(&set(&[Reg::Ax]));
        assert_eq!(out, set(&[Reg::Ax, Reg::Ah, Reg::Al]));
    }

    #[test]
    fn expands_flag_bits_transitively() {
        let out = expand_subregs(&set(&[Reg::Flags]));
        assert!(out.contains(&Reg::HFlags));
        assert!(out.contains(&Reg::Cf));
        assert!(out.contains(&Reg::Tf));
    }

    #[test]
    fn aliases_of_a_byte_register_include_the_word() {
        let out = expand_aliases(&set(&[Reg::Ah]));
        assert_eq!(out, set(&[Reg::Ah, Reg::Ax]));
    }

    #[test]
    fn aliases_of_a_flag_bit_include_both_groups() {
        let out = expand_aliases(&set(&[Reg::Zf]));
        assert_eq!(out, set(&[Reg::Zf, Reg::HFlags, Reg::Flags]));
    }

    #[test]
    fn coverings_recognise_complete_pairs() {
        let out = expand_coverings(&set(&[Reg::Ah, Reg::Al, Reg::Bh]));
        assert!(out.contains(&Reg::Ax));
        assert!(!out.contains(&Reg::Bx));
    }

    #[test]
    fn flag_groups_are_not_coverings() {
        let bits = set(&[
            Reg::Sf,
            Reg::Zf,
            Reg::Af,
            Reg::Pf,
            Reg::Cf,
            Reg::Of,
            Reg::Df,
            Reg::If,
            Reg::Tf,
        ]);
        let out = expand_coverings(&bits);
        assert!(!out.contains(&Reg::Flags));
        assert!(!out.contains(&Reg::HFlags));
    }

    #[test]
    fn decompose_splits_words() {
        let out = decompose_coverings(&set(&[Reg::Ax, Reg::Si]));
        assert_eq!(out, set(&[Reg::Ah, Reg::Al, Reg::Si]));
    }

    #[test]
    fn operand_names_exclude_synthetic_registers() {
        assert_eq!(Reg::from_operand_name("AX"), Some(Reg::Ax));
        assert_eq!(Reg::from_operand_name("flags"), None);
        assert_eq!(Reg::from_name("flags"), Some(Reg::Flags));
    }
}
