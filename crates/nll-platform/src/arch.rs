//! CPU architecture resolution with ARM float-ABI detection.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{PlatformError, PlatformResult};

/// Architecture token for ARM with the hard-float calling convention.
pub const ARCH_ARMHF: &str = "armhf";

/// Architecture token for ARM with the soft-float calling convention.
pub const ARCH_ARMEL: &str = "armel";

/// Attribute line `readelf -A` prints for hard-float executables.
pub const HARD_FLOAT_TAG: &str = "Tag_ABI_VFP_args: VFP registers";

/// Tells whether the running process uses the ARM hard-float ABI.
pub trait AbiProbe: Send + Sync {
    /// `Ok(true)` for hard-float, `Ok(false)` for soft-float.
    fn is_hard_float(&self) -> PlatformResult<bool>;
}

impl<F> AbiProbe for F
where
    F: Fn() -> PlatformResult<bool> + Send + Sync,
{
    fn is_hard_float(&self) -> PlatformResult<bool> {
        self()
    }
}

/// Reads the ELF attribute section of an executable with `readelf -A`.
///
/// Defaults to inspecting `/proc/self/exe`, i.e. the running process.
#[derive(Debug, Clone)]
pub struct ReadelfProbe {
    program: String,
    target: PathBuf,
}

impl ReadelfProbe {
    /// `readelf` from `PATH` against `/proc/self/exe`.
    pub fn new() -> Self {
        Self {
            program: "readelf".to_string(),
            target: PathBuf::from("/proc/self/exe"),
        }
    }

    /// Use a different `readelf` binary (e.g. a cross toolchain's).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Inspect a different ELF file.
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    /// Whether `readelf -A` output carries the hard-float tag.
    pub fn output_is_hard_float(output: &str) -> bool {
        output.lines().any(|line| line.contains(HARD_FLOAT_TAG))
    }
}

impl Default for ReadelfProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AbiProbe for ReadelfProbe {
    fn is_hard_float(&self) -> PlatformResult<bool> {
        let output = Command::new(&self.program)
            .arg("-A")
            .arg(&self.target)
            .output()
            .map_err(|e| PlatformError::abi_io(format!("failed to run {}", self.program), e))?;

        if !output.status.success() {
            return Err(PlatformError::abi(format!(
                "{} exited with code {:?}",
                self.program,
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::output_is_hard_float(&stdout))
    }
}

/// Resolve a raw architecture name to the token used in resource paths.
///
/// Anything containing `arm` becomes [`ARCH_ARMHF`] or [`ARCH_ARMEL`] as the
/// probe decides; probe failure is fatal. Other names are lowercased.
pub fn resolve_architecture(raw_arch: &str, probe: &dyn AbiProbe) -> PlatformResult<String> {
    let lowered = raw_arch.to_lowercase();
    if !lowered.contains("arm") {
        return Ok(lowered);
    }

    let hard_float = probe.is_hard_float()?;
    debug!(raw_arch, hard_float, "ARM float ABI detected");
    Ok(if hard_float { ARCH_ARMHF } else { ARCH_ARMEL }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SOFT_FLOAT_OUTPUT: &str = "Attribute Section: aeabi\n\
        File Attributes\n  Tag_CPU_name: \"7-A\"\n  Tag_ABI_FP_denormal: Needed\n";

    const HARD_FLOAT_OUTPUT: &str = "Attribute Section: aeabi\n\
        File Attributes\n  Tag_CPU_name: \"7-A\"\n  Tag_ABI_VFP_args: VFP registers\n";

    #[test]
    fn test_non_arm_is_lowercased_without_probe() {
        let calls = AtomicUsize::new(0);
        let probe = || -> PlatformResult<bool> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        };

        assert_eq!(resolve_architecture("AMD64", &probe).unwrap(), "amd64");
        assert_eq!(resolve_architecture("x86", &probe).unwrap(), "x86");
        assert_eq!(resolve_architecture("aarch64", &probe).unwrap(), "aarch64");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_arm_hard_float() {
        let probe = || -> PlatformResult<bool> { Ok(true) };
        assert_eq!(resolve_architecture("arm", &probe).unwrap(), ARCH_ARMHF);
    }

    #[test]
    fn test_armv7l_without_hard_float_tag_is_armel() {
        let probe = || -> PlatformResult<bool> {
            Ok(ReadelfProbe::output_is_hard_float(SOFT_FLOAT_OUTPUT))
        };
        assert_eq!(resolve_architecture("armv7l", &probe).unwrap(), ARCH_ARMEL);
    }

    #[test]
    fn test_arm_probe_failure_is_fatal() {
        let probe = || -> PlatformResult<bool> { Err(PlatformError::abi("readelf missing")) };
        let err = resolve_architecture("ARMv7", &probe).unwrap_err();
        assert!(matches!(err, PlatformError::AbiDetectionFailed { .. }));
    }

    #[test]
    fn test_output_parsing() {
        assert!(ReadelfProbe::output_is_hard_float(HARD_FLOAT_OUTPUT));
        assert!(!ReadelfProbe::output_is_hard_float(SOFT_FLOAT_OUTPUT));
        assert!(!ReadelfProbe::output_is_hard_float(""));
    }

    #[test]
    fn test_missing_readelf_binary_fails() {
        let probe = ReadelfProbe::new().with_program("definitely-not-a-readelf-binary");
        match probe.is_hard_float() {
            Err(PlatformError::AbiDetectionFailed { source, .. }) => assert!(source.is_some()),
            other => panic!("expected AbiDetectionFailed, got {other:?}"),
        }
    }
}
