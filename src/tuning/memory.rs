//! Executor memory budget
//!
//! Splits the memory one executor may use into heap, overhead, pinned pool and
//! spill pool. Feasibility is checked twice: a coarse pre-check against the
//! minimum overhead, then a check of the final overhead once the pools are
//! sized.

use serde::Serialize;

pub const HEAP_PER_CORE_MIB: u64 = 2048;
pub const MIN_HEAP_PER_CORE_MIB: u64 = 750;
pub const DEFAULT_PINNED_MIB: u64 = 1024;
pub const DEFAULT_SPILL_MIB: u64 = 1024;
pub const MAX_PINNED_MIB: u64 = 4096;
pub const HEAP_OVERHEAD_FRACTION: f64 = 0.1;
pub const MAX_BYTES_IN_FLIGHT_MIB: u64 = 4096;
/// Cores needed before the in-flight allowance is reserved
pub const MAX_BYTES_IN_FLIGHT_MIN_CORES: u32 = 16;

/// Inputs of one budget computation, all sizes in MiB
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryRequest {
    pub cores: u32,
    /// Worker memory share of one executor before the platform fraction
    pub container_mib: f64,
    pub usable_fraction: f64,
    pub off_heap_mib: u64,
    pub pyspark_mib: u64,
    pub is_csp: bool,
    pub enforced_heap_mib: Option<u64>,
    pub enforced_overhead_mib: Option<u64>,
    pub enforced_pinned_mib: Option<u64>,
    pub enforced_spill_mib: Option<u64>,
}

impl MemoryRequest {
    fn any_enforced(&self) -> bool {
        self.enforced_heap_mib.is_some()
            || self.enforced_overhead_mib.is_some()
            || self.enforced_pinned_mib.is_some()
            || self.enforced_spill_mib.is_some()
    }

    fn usable_mib(&self) -> f64 {
        self.container_mib * self.usable_fraction
    }

    /// Pure: Largest heap that still leaves room for the default pools
    pub fn heap_budget_mib(&self) -> u64 {
        let pools = DEFAULT_PINNED_MIB + DEFAULT_SPILL_MIB;
        let reserved = (self.off_heap_mib + self.pyspark_mib + pools) as f64;
        let fitting = ((self.usable_mib() - reserved) / (1.0 + HEAP_OVERHEAD_FRACTION)).max(0.0);
        (HEAP_PER_CORE_MIB * self.cores as u64).min(fitting as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryPlan {
    pub heap_mib: u64,
    pub overhead_mib: u64,
    pub pinned_mib: u64,
    pub spill_mib: u64,
    /// Room was reserved for multi-threaded shuffle bytes in flight
    pub set_max_bytes_in_flight: bool,
}

/// The executor does not fit in the memory available to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryShortfall {
    /// Smallest per-executor container that would fit the request
    pub required_mib: u64,
}

impl MemoryShortfall {
    pub fn comment(&self, executors_per_worker: u32) -> String {
        format!(
            "This node/worker configuration is not ideal for GPU execution. \
             Each worker needs at least {}MB of memory for the recommended executor layout.",
            self.required_mib * executors_per_worker.max(1) as u64
        )
    }
}

/// Pure: Smallest whole container size whose usable share covers `need_mib`
fn required_container_mib(need_mib: u64, fraction: f64) -> u64 {
    let need = need_mib as f64;
    let mut required = (need / fraction).ceil() as u64;
    while (required as f64) * fraction < need {
        required += 1;
    }
    while required > 0 && ((required - 1) as f64) * fraction >= need {
        required -= 1;
    }
    required
}

/// Pure: Size the executor memory regions for one request
pub fn plan_memory(req: &MemoryRequest) -> Result<MemoryPlan, MemoryShortfall> {
    let cores = req.cores.max(1) as u64;
    let heap = req
        .enforced_heap_mib
        .unwrap_or_else(|| req.heap_budget_mib().max(MIN_HEAP_PER_CORE_MIB * cores));
    let base_overhead = (heap as f64 * HEAP_OVERHEAD_FRACTION) as u64;
    let min_overhead = req
        .enforced_overhead_mib
        .unwrap_or(base_overhead + DEFAULT_PINNED_MIB + DEFAULT_SPILL_MIB);

    let fixed = heap + req.off_heap_mib + req.pyspark_mib;
    let usable = req.usable_mib();
    if usable < (fixed + min_overhead) as f64 {
        return Err(MemoryShortfall {
            required_mib: required_container_mib(fixed + min_overhead, req.usable_fraction),
        });
    }
    let exec_left = (usable - fixed as f64).floor() as u64;

    let pinned = req.enforced_pinned_mib.unwrap_or_else(|| {
        (exec_left.saturating_sub(base_overhead) / 2).min(MAX_PINNED_MIB)
    });
    let spill = req.enforced_spill_mib.unwrap_or(pinned);

    let mut overhead = base_overhead + pinned + spill;
    let mut set_max_bytes_in_flight = false;
    if req.is_csp
        && req.cores >= MAX_BYTES_IN_FLIGHT_MIN_CORES
        && exec_left >= overhead + MAX_BYTES_IN_FLIGHT_MIB
    {
        overhead += MAX_BYTES_IN_FLIGHT_MIB;
        set_max_bytes_in_flight = true;
    }
    if let Some(enforced) = req.enforced_overhead_mib {
        overhead = overhead.max(enforced);
    }

    if overhead > exec_left {
        if req.any_enforced() {
            return Err(MemoryShortfall {
                required_mib: required_container_mib(fixed + overhead, req.usable_fraction),
            });
        }
        return Ok(MemoryPlan {
            heap_mib: heap,
            overhead_mib: base_overhead + DEFAULT_PINNED_MIB + DEFAULT_SPILL_MIB,
            pinned_mib: DEFAULT_PINNED_MIB,
            spill_mib: DEFAULT_SPILL_MIB,
            set_max_bytes_in_flight: false,
        });
    }

    Ok(MemoryPlan {
        heap_mib: heap,
        overhead_mib: overhead,
        pinned_mib: pinned,
        spill_mib: spill,
        set_max_bytes_in_flight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cores: u32, container_mib: f64) -> MemoryRequest {
        MemoryRequest {
            cores,
            container_mib,
            usable_fraction: 0.8,
            ..MemoryRequest::default()
        }
    }

    #[test]
    fn test_small_worker_fits() {
        // 16 cores / 32 GiB worker backing a single executor
        let plan = plan_memory(&request(16, 32768.0)).unwrap();
        let usable = 32768.0 * 0.8;
        assert!((plan.heap_mib + plan.overhead_mib) as f64 <= usable);
        assert!(plan.heap_mib >= MIN_HEAP_PER_CORE_MIB * 16);
        assert!(plan.pinned_mib >= DEFAULT_PINNED_MIB);
        assert_eq!(plan.pinned_mib, plan.spill_mib);
        assert!(!plan.set_max_bytes_in_flight);
    }

    #[test]
    fn test_large_worker_caps_heap_and_pinned() {
        let plan = plan_memory(&request(8, 65536.0)).unwrap();
        assert_eq!(plan.heap_mib, 16384);
        assert_eq!(plan.pinned_mib, MAX_PINNED_MIB);
        assert_eq!(plan.overhead_mib, 1638 + 2 * MAX_PINNED_MIB);
    }

    #[test]
    fn test_csp_with_many_cores_reserves_bytes_in_flight() {
        let req = MemoryRequest {
            is_csp: true,
            ..request(16, 98304.0)
        };
        let plan = plan_memory(&req).unwrap();
        assert!(plan.set_max_bytes_in_flight);
        assert_eq!(
            plan.overhead_mib,
            3276 + 2 * MAX_PINNED_MIB + MAX_BYTES_IN_FLIGHT_MIB
        );
    }

    #[test]
    fn test_enforced_values_that_do_not_fit_fail() {
        let req = MemoryRequest {
            enforced_heap_mib: Some(40960),
            enforced_overhead_mib: Some(30720),
            ..request(8, 65536.0)
        };
        let shortfall = plan_memory(&req).unwrap_err();
        assert_eq!(shortfall.required_mib, 89600);
        assert!(shortfall.comment(1).contains("89600MB"));
    }

    #[test]
    fn test_shortfall_reproduces_boundary() {
        let req = MemoryRequest {
            enforced_heap_mib: Some(12000),
            ..request(4, 10000.0)
        };
        let shortfall = plan_memory(&req).unwrap_err();

        let at_boundary = MemoryRequest {
            container_mib: shortfall.required_mib as f64,
            ..req.clone()
        };
        assert!(plan_memory(&at_boundary).is_ok());

        let below = MemoryRequest {
            container_mib: (shortfall.required_mib - 1) as f64,
            ..req
        };
        assert!(plan_memory(&below).is_err());
    }

    #[test]
    fn test_enforced_pools_exceeding_left_memory_fail() {
        let req = MemoryRequest {
            enforced_pinned_mib: Some(8192),
            enforced_spill_mib: Some(8192),
            ..request(4, 16384.0)
        };
        assert!(plan_memory(&req).is_err());
    }

    #[test]
    fn test_off_heap_and_pyspark_reduce_budget() {
        let plain = plan_memory(&request(8, 32768.0)).unwrap();
        let reduced = plan_memory(&MemoryRequest {
            off_heap_mib: 4096,
            pyspark_mib: 4096,
            ..request(8, 32768.0)
        })
        .unwrap();
        assert!(reduced.heap_mib < plain.heap_mib);
    }
}
