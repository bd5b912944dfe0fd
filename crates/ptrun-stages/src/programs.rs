//! Fixed Datalog programs the pipeline feeds to the solver.
use std::path::Path;

/// Domain description file produced by relation generation
pub const DOMAIN_FILE: &str = "fielddomains.pa";

const BASEDIR: &str = "{basedir}";

/// Context numbering over the call graph. The first run with an
/// unpatched `VC` domain only reports how many paths it needs.
pub const NUMBERING: &str = r#"# -*- Mode: C; indent-tabs-mode: nil; c-basic-offset: 4 -*-
### Context-sensitive inclusion-based pointer analysis using cloning
#
# Calculates the numbering based on the call graph relation.

.basedir "{basedir}"
.include "fielddomains.pa"

.bddnodes 10000000
.bddcache 1000000

.bddvarorder C0_C1_N0_F0_I0_M1_M0_V1xV0_VC1xVC0_T0_Z0_T1_H0_H1_G0

### Relations

mI (method:M0, invoke:I0, name:N0) input
IE0 (invoke:I0, target:M0) input

roots (method:M0) input

mI0 (method:M0, invoke:I0)
IEnum (invoke:I0, target:M0, ccaller:VC1, ccallee:VC0) output

### Rules

mI0(m,i) :- mI(m,i,_).
IEnum(i,m,vc2,vc1) :- roots(m), mI0(m,i), IE0(i,m). number
"#;

/// Dumps the type assignability relation for query translation.
pub const DUMP_TYPES: &str = r#".basedir "{basedir}"

### Domains

.include "fielddomains.pa"

.bddvarorder M1_I0_N0_F0_M0_V1xV0_H1_Z0_T0_T1_H0
### Relations

aT (type1:T0, type2:T1) input outputtuples
"#;

/// Fills in the program's base directory.
pub fn render(template: &str, basedir: &Path) -> String {
    template.replace(BASEDIR, &basedir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sets_basedir() {
        let text = render(NUMBERING, Path::new("/work/results"));
        assert!(text.contains(".basedir \"/work/results\""));
        assert!(!text.contains(BASEDIR));
        assert!(text.contains("IEnum(i,m,vc2,vc1) :- roots(m), mI0(m,i), IE0(i,m). number"));
    }

    #[test]
    fn test_dump_types_outputs_tuples() {
        let text = render(DUMP_TYPES, Path::new("r"));
        assert!(text.contains("aT (type1:T0, type2:T1) input outputtuples"));
    }
}
