//! Native binary build step.
//!
//! Build steps
//! -----------
//! 1. Write the generated `program.c` to `$TMPDIR/lazyc_build_<PID>_<N>/`.
//! 2. Write the embedded `lazyc_runtime.h` + `lazyc_runtime.c` next to it.
//! 3. `<cc> -O2 -I <dir> program.c lazyc_runtime.c -o <output>`
//! 4. Return the path to the output binary.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;

use crate::error::CodegenError;

// ---------------------------------------------------------------------------
// Embedded runtime sources (compiled into the lazyc binary itself)
// ---------------------------------------------------------------------------

pub const RUNTIME_H_SRC: &str = include_str!("../runtime/lazyc_runtime.h");

pub const RUNTIME_C_SRC: &str = include_str!("../runtime/lazyc_runtime.c");

/// Environment variable naming the C compiler when `--cc` is not given.
pub const CC_ENV: &str = "LAZYC_CC";

static BUILD_COUNTER: AtomicUsize = AtomicUsize::new(0);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Picks the C compiler: the explicit choice, else `$LAZYC_CC`, else `cc`.
pub fn resolve_compiler(explicit: Option<&str>) -> String {
    if let Some(cc) = explicit {
        return cc.to_owned();
    }
    match std::env::var(CC_ENV) {
        Ok(cc) if !cc.trim().is_empty() => cc,
        _ => "cc".to_owned(),
    }
}

/// Compiles generated C source together with the embedded runtime.
///
/// Returns the path of the produced executable, or `Toolchain` when the
/// compiler cannot be started or reports failure.
pub fn build_binary(c_source: &str, output_path: &Path, cc: &str) -> Result<PathBuf, CodegenError> {
    let n = BUILD_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_dir = std::env::temp_dir().join(format!("lazyc_build_{}_{}", std::process::id(), n));
    std::fs::create_dir_all(&tmp_dir).map_err(|e| CodegenError::Toolchain {
        detail: format!("failed to create temp dir '{}': {}", tmp_dir.display(), e),
    })?;

    let program_path = tmp_dir.join("program.c");
    let h_path = tmp_dir.join("lazyc_runtime.h");
    let c_path = tmp_dir.join("lazyc_runtime.c");
    for (path, contents) in [
        (&program_path, c_source),
        (&h_path, RUNTIME_H_SRC),
        (&c_path, RUNTIME_C_SRC),
    ] {
        std::fs::write(path, contents).map_err(|e| CodegenError::Toolchain {
            detail: format!("failed to write '{}': {}", path.display(), e),
        })?;
    }

    info!("compiling {} with {}", program_path.display(), cc);
    let status = Command::new(cc)
        .arg("-O2")
        .arg("-I")
        .arg(&tmp_dir)
        .arg(&program_path)
        .arg(&c_path)
        .arg("-o")
        .arg(output_path)
        .status();
    let _ = std::fs::remove_dir_all(&tmp_dir);
    let status = status.map_err(|e| CodegenError::Toolchain {
        detail: format!("C compiler '{}' could not start: {}", cc, e),
    })?;
    if !status.success() {
        return Err(CodegenError::Toolchain {
            detail: format!("'{}' failed to compile the program (exit: {:?})", cc, status.code()),
        });
    }

    info!("wrote {}", output_path.display());
    Ok(output_path.to_path_buf())
}

pub fn runtime_c_source() -> &'static str {
    RUNTIME_C_SRC
}

pub fn runtime_h_source() -> &'static str {
    RUNTIME_H_SRC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_compiler_wins() {
        assert_eq!(resolve_compiler(Some("clang")), "clang");
    }

    #[test]
    fn runtime_declares_the_entry_points_used_by_generated_code() {
        for sym in ["lz_apply", "lz_alloc_closure", "lz_truthy", "lz_is_unit", "lz_print_val"] {
            assert!(runtime_h_source().contains(sym), "missing {}", sym);
        }
        for i in crate::ir::Intrinsic::ALL {
            assert!(runtime_h_source().contains(i.runtime_symbol()));
            assert!(runtime_c_source().contains(i.runtime_symbol()));
        }
    }
}
