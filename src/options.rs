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

use docopt::Docopt;
use stderrlog;

use ast::ir::HardwareRegister;
use error::RegAllocError;

use std::env;

const USAGE: &'static str = "
mu register allocator. Pass arguments as a string to configure it.

Usage:
  mu_regalloc [options]

Logging:
  --log-level=<level>                   logging level: none, error, warn, info, debug, trace, env [default: env]

Register allocation:
  --disable-coalescing                  do not coalesce copy related registers
  --disable-regalloc-validate           disable validation of the final allocation after spill rewriting
  --backup-regs=<regs>                  comma separated scratch registers reserved for spilling [default: r10,r11]
";

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerOptions {
    // logging
    pub flag_log_level: LogLevel,

    // register allocation
    pub flag_disable_coalescing: bool,
    pub flag_disable_regalloc_validate: bool,
    pub flag_backup_regs: String
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Env
}

impl LogLevel {
    pub fn from_string(s: &str) -> Result<LogLevel, RegAllocError> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(LogLevel::None),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            "env" => Ok(LogLevel::Env),
            _ => Err(RegAllocError::InvalidOptions(format!(
                "unrecognised log level {}",
                s
            )))
        }
    }
}

impl CompilerOptions {
    pub fn init(str: &str) -> Result<CompilerOptions, RegAllocError> {
        info!("init compiler options with: {:?}", str);

        let ret: CompilerOptions = Docopt::new(USAGE)
            .and_then(|d| d.argv(::std::iter::once("mu_regalloc").chain(str.split_whitespace()))
                .deserialize())
            .map_err(|e| RegAllocError::InvalidOptions(e.to_string()))?;

        // fail early on bad register names
        ret.backup_registers()?;

        info!("parsed as {:?}", ret);
        Ok(ret)
    }

    /// the configured scratch registers for spill rewriting
    pub fn backup_registers(&self) -> Result<Vec<HardwareRegister>, RegAllocError> {
        self.flag_backup_regs
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                HardwareRegister::from_name(name).ok_or_else(|| {
                    RegAllocError::InvalidOptions(format!("unknown register {}", name))
                })
            })
            .collect()
    }
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            flag_log_level: LogLevel::Env,
            flag_disable_coalescing: false,
            flag_disable_regalloc_validate: false,
            flag_backup_regs: "r10,r11".to_string()
        }
    }
}

/// starts logging at the given level
pub fn start_logging(level: LogLevel) {
    match level {
        LogLevel::None => {}
        LogLevel::Error => start_logging_internal(0),
        LogLevel::Warn => start_logging_internal(1),
        LogLevel::Info => start_logging_internal(2),
        LogLevel::Debug => start_logging_internal(3),
        LogLevel::Trace => start_logging_internal(4),
        LogLevel::Env => match env::var("MU_LOG_LEVEL") {
            Ok(s) => match LogLevel::from_string(&s) {
                Ok(LogLevel::Env) | Err(_) => {}
                Ok(level) => start_logging(level)
            },
            _ => {} // Don't log
        }
    }
}

pub fn start_logging_trace() {
    start_logging(LogLevel::Trace)
}

fn start_logging_internal(verbose: usize) {
    match stderrlog::new().verbosity(verbose).init() {
        Ok(()) => info!("logger initialized"),
        Err(e) => debug!("failed to init logger, probably already initialized: {:?}", e)
    }
}
