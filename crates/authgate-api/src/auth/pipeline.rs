//! 게이트 파이프라인.
//!
//! 등록된 순서대로 게이트를 실행하며 첫 번째 실패에서 멈춥니다.
//! 게이트 내부 패닉은 해당 게이트의 [`Gate::fault`]로 분류됩니다.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, error};

use super::gate::{Gate, GateOutcome, RequestContext};
use crate::error::ApiError;

/// 순서가 있는 게이트 목록.
#[derive(Clone, Default)]
pub struct Pipeline {
    gates: Vec<Arc<dyn Gate>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.gates.iter().map(|g| g.name()).collect();
        f.debug_struct("Pipeline").field("gates", &names).finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 게이트를 끝에 추가.
    #[must_use]
    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// 게이트를 순서대로 실행.
    ///
    /// 모든 게이트를 통과하면 최종 컨텍스트를, 아니면 첫 번째 실패를 반환합니다.
    pub fn run(&self, headers: &HeaderMap, ctx: RequestContext) -> Result<RequestContext, ApiError> {
        let mut ctx = ctx;

        for gate in &self.gates {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| gate.check(headers, ctx)));

            ctx = match outcome {
                Ok(GateOutcome::Continue(next)) => next,
                Ok(GateOutcome::ShortCircuit(err)) => {
                    debug!(
                        gate = gate.name(),
                        status = err.code(),
                        message = %err.message(),
                        "Request short-circuited"
                    );
                    return Err(err);
                }
                Err(payload) => {
                    let cause = panic_message(payload.as_ref());
                    error!(gate = gate.name(), cause = %cause, "Gate panicked");
                    return Err(gate.fault(cause));
                }
            };
        }

        Ok(ctx)
    }
}

/// 패닉 페이로드를 문자열로 변환.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
