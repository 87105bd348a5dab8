//! The navigation pipeline.
//!
//! A navigation resolves its target, runs the guard phases one after the
//! other and commits. Every attempt takes a generation number; after each
//! guard and before the commit the attempt checks that no newer attempt
//! started, and ends with a cancelled failure otherwise. Superseded guard
//! futures still run to completion, their results are ignored.
//!
//! Phases, in order:
//!
//! 1. leave guards of the records being left, deepest first
//! 2. update guards of the records kept with other params, query or hash
//! 3. global `before_each` guards
//! 4. enter guards of the records being entered, shallowest first
//! 5. view resolution
//! 6. global `before_resolve` guards
//! 7. commit

use std::sync::Arc;
use std::sync::atomic::Ordering;

use wayfinder_history::{HistoryState, NavigationInformation, NavigationType};

use crate::error::NavigationError;
use crate::failure::{NavigationFailure, NavigationFailureKind};
use crate::guard::{GuardResult, SharedGuard};
use crate::location::{RouteLocation, RouteLocationRaw, is_same_route_location};
use crate::record::RouteRecord;
use crate::router::RouterInner;

/// What `push` and `replace` resolve to: `None` once committed, a failure
/// for expected non-committing outcomes.
pub type NavigationResult = Result<Option<NavigationFailure>, NavigationError>;

/// Steps a navigation attempt goes through. Reported in trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationPhase {
	/// Resolving the target.
	Resolving,
	/// Leave guards.
	GuardingLeave,
	/// Update guards.
	GuardingUpdate,
	/// Global before guards.
	GuardingBefore,
	/// Enter guards.
	GuardingEnter,
	/// Awaiting the view resolver.
	ResolvingViews,
	/// Global before-resolve guards.
	GuardingBeforeResolve,
	/// Publishing the target.
	Committing,
}

/// Why an attempt stopped before committing.
enum Interrupt {
	Failure(NavigationFailure),
	Redirect(RouteLocationRaw),
	Error(NavigationError),
}

/// Records left, kept and entered when going from `from` to `to`.
pub(crate) struct ChangingRecords {
	pub(crate) leaving: Vec<Arc<RouteRecord>>,
	pub(crate) updating: Vec<Arc<RouteRecord>>,
	pub(crate) entering: Vec<Arc<RouteRecord>>,
}

pub(crate) fn extract_changing_records(to: &RouteLocation, from: &RouteLocation) -> ChangingRecords {
	let mut changes = ChangingRecords {
		leaving: Vec::new(),
		updating: Vec::new(),
		entering: Vec::new(),
	};
	let len = from.matched.len().max(to.matched.len());
	for index in 0..len {
		if let Some(record) = from.matched.get(index) {
			if to.matched.iter().any(|other| other.is_same_record(record)) {
				changes.updating.push(record.clone());
			} else {
				changes.leaving.push(record.clone());
			}
		}
		if let Some(record) = to.matched.get(index) {
			if !from.matched.iter().any(|other| other.is_same_record(record)) {
				changes.entering.push(record.clone());
			}
		}
	}
	changes
}

/// Moves the navigation options of the previous target onto a redirect
/// target that does not set them.
fn carry_options(target: RouteLocationRaw, previous: &mut RouteLocationRaw) -> RouteLocationRaw {
	RouteLocationRaw {
		force: target.force || previous.force,
		replace: target.replace || previous.replace,
		state: target.state.or_else(|| previous.state.take()),
		..target
	}
}

impl RouterInner {
	fn begin_attempt(&self) -> u64 {
		self.generation.fetch_add(1, Ordering::SeqCst) + 1
	}

	fn ensure_current(
		&self,
		token: u64,
		to: &Arc<RouteLocation>,
		from: &Arc<RouteLocation>,
	) -> Result<(), Interrupt> {
		if self.generation.load(Ordering::SeqCst) == token {
			return Ok(());
		}
		tracing::debug!(to = %to.full_path, "navigation cancelled by a newer navigation");
		Err(Interrupt::Failure(NavigationFailure::new(
			NavigationFailureKind::Cancelled,
			from.clone(),
			to.clone(),
		)))
	}

	/// Runs `push`/`replace`, restarting on record and guard redirects.
	pub(crate) async fn push_with_redirect(
		&self,
		raw: RouteLocationRaw,
		redirected_from: Option<RouteLocation>,
	) -> NavigationResult {
		let mut raw = raw;
		let mut redirected_from = redirected_from;
		let mut hops = 0;

		loop {
			let from = self.current();
			let token = self.begin_attempt();
			tracing::trace!(phase = ?NavigationPhase::Resolving, "starting navigation");

			let resolved = self
				.resolve_location(&raw, &from)
				.and_then(|to| self.redirect_target(&to).map(|target| (to, target)));
			let (mut to, redirect) = match resolved {
				Ok(resolved) => resolved,
				Err(error) => {
					let error = NavigationError::from(error);
					self.mark_ready(Some(error.clone()));
					return Err(error);
				}
			};

			if let Some(target) = redirect {
				hops += 1;
				if hops > self.options.max_redirects {
					return Ok(Some(self.redirect_limit(from, Arc::new(to))));
				}
				tracing::debug!(from = %to.full_path, "following route redirect");
				raw = carry_options(target, &mut raw);
				redirected_from.get_or_insert(to);
				continue;
			}

			to.redirected_from = redirected_from.clone().map(Box::new);
			let to = Arc::new(to);

			if !raw.force && is_same_route_location(&from, &to) {
				tracing::debug!(to = %to.full_path, "navigation to the current location");
				let failure =
					NavigationFailure::new(NavigationFailureKind::Duplicated, from.clone(), to.clone());
				return Ok(Some(self.conclude(failure)));
			}

			let outcome = match self.navigate(&to, &from, token).await {
				Ok(()) => {
					let state = raw.state.take();
					self.commit(&to, &from, Some((raw.replace, state)), token).await
				}
				Err(interrupt) => Err(interrupt),
			};

			match outcome {
				Ok(()) => {
					self.trigger_after_each(&to, &from, None);
					return Ok(None);
				}
				Err(Interrupt::Failure(failure)) => return Ok(Some(self.conclude(failure))),
				Err(Interrupt::Redirect(target)) => {
					hops += 1;
					if hops > self.options.max_redirects {
						return Ok(Some(self.redirect_limit(from, to)));
					}
					tracing::debug!(from = %to.full_path, "guard redirected navigation");
					raw = carry_options(target, &mut raw);
					redirected_from.get_or_insert_with(|| (*to).clone());
				}
				Err(Interrupt::Error(error)) => return Err(self.trigger_error(error, &to, &from)),
			}
		}
	}

	/// Runs every guard phase and the view resolver.
	async fn navigate(
		&self,
		to: &Arc<RouteLocation>,
		from: &Arc<RouteLocation>,
		token: u64,
	) -> Result<(), Interrupt> {
		let changes = extract_changing_records(to, from);

		let leave: Vec<SharedGuard> = changes
			.leaving
			.iter()
			.rev()
			.flat_map(|record| record.before_leave.iter().cloned())
			.collect();
		self.run_guards(NavigationPhase::GuardingLeave, leave, to, from, token)
			.await?;

		let update: Vec<SharedGuard> = changes
			.updating
			.iter()
			.flat_map(|record| record.before_update.iter().cloned())
			.collect();
		self.run_guards(NavigationPhase::GuardingUpdate, update, to, from, token)
			.await?;

		let before = self.before_guards.read().list();
		self.run_guards(NavigationPhase::GuardingBefore, before, to, from, token)
			.await?;

		let enter: Vec<SharedGuard> = changes
			.entering
			.iter()
			.flat_map(|record| record.before_enter.iter().cloned())
			.collect();
		self.run_guards(NavigationPhase::GuardingEnter, enter, to, from, token)
			.await?;

		if let Some(resolver) = &self.view_resolver {
			tracing::trace!(phase = ?NavigationPhase::ResolvingViews, to = %to.full_path);
			let resolved = resolver.resolve_views(to).await;
			self.ensure_current(token, to, from)?;
			if let Err(error) = resolved {
				tracing::warn!(to = %to.full_path, error = %error, "view resolution failed");
				return Err(Interrupt::Error(NavigationError::ViewResolution(error)));
			}
		}

		let resolve = self.resolve_guards.read().list();
		self.run_guards(NavigationPhase::GuardingBeforeResolve, resolve, to, from, token)
			.await
	}

	async fn run_guards(
		&self,
		phase: NavigationPhase,
		guards: Vec<SharedGuard>,
		to: &Arc<RouteLocation>,
		from: &Arc<RouteLocation>,
		token: u64,
	) -> Result<(), Interrupt> {
		tracing::trace!(?phase, to = %to.full_path, guards = guards.len());
		for guard in guards {
			let result = guard.check(to.clone(), from.clone()).await;
			self.ensure_current(token, to, from)?;
			match result {
				GuardResult::Continue => {}
				GuardResult::Abort => {
					tracing::debug!(?phase, to = %to.full_path, "navigation aborted by a guard");
					return Err(Interrupt::Failure(NavigationFailure::new(
						NavigationFailureKind::Aborted,
						from.clone(),
						to.clone(),
					)));
				}
				GuardResult::Redirect(target) => return Err(Interrupt::Redirect(target)),
				GuardResult::Error(error) => {
					tracing::warn!(?phase, to = %to.full_path, error = %error, "navigation guard failed");
					return Err(Interrupt::Error(error.into()));
				}
			}
		}
		self.ensure_current(token, to, from)
	}

	/// Publishes `to`. `write` carries the replace flag and the entry state
	/// when the history needs a new entry; history events pass `None`.
	async fn commit(
		&self,
		to: &Arc<RouteLocation>,
		from: &Arc<RouteLocation>,
		write: Option<(bool, Option<HistoryState>)>,
		token: u64,
	) -> Result<(), Interrupt> {
		self.ensure_current(token, to, from)?;
		tracing::trace!(phase = ?NavigationPhase::Committing, to = %to.full_path);

		if let Some((replace, state)) = write {
			let first = !self.committed.load(Ordering::SeqCst);
			let written = if replace || first {
				self.history.replace(&to.full_path, state).await
			} else {
				self.history.push(&to.full_path, state).await
			};
			// past this point the entry exists, so the slot must follow it
			written.map_err(|error| Interrupt::Error(error.into()))?;
		}

		self.current.send_replace(to.clone());
		self.committed.store(true, Ordering::SeqCst);
		self.mark_ready(None);
		self.setup_listeners();
		Ok(())
	}

	fn redirect_limit(&self, from: Arc<RouteLocation>, to: Arc<RouteLocation>) -> NavigationFailure {
		tracing::debug!(
			to = %to.full_path,
			limit = self.options.max_redirects,
			"navigation exceeded the redirect limit"
		);
		self.conclude(NavigationFailure::redirect_limit(
			from,
			to,
			self.options.max_redirects,
		))
	}

	/// Reports a failure to the observers.
	fn conclude(&self, failure: NavigationFailure) -> NavigationFailure {
		self.trigger_after_each(&failure.to, &failure.from, Some(&failure));
		if !failure.is(NavigationFailureKind::Cancelled) {
			self.mark_ready(None);
		}
		failure
	}

	fn trigger_after_each(
		&self,
		to: &RouteLocation,
		from: &RouteLocation,
		failure: Option<&NavigationFailure>,
	) {
		let hooks = self.after_hooks.read().list();
		for hook in hooks {
			hook(to, from, failure);
		}
	}

	fn trigger_error(
		&self,
		error: NavigationError,
		to: &RouteLocation,
		from: &RouteLocation,
	) -> NavigationError {
		let handlers = self.error_handlers.read().list();
		if handlers.is_empty() {
			tracing::warn!(to = %to.full_path, error = %error, "unhandled error during navigation");
		}
		for handler in handlers {
			handler(&error, to, from);
		}
		self.mark_ready(Some(error.clone()));
		error
	}

	/// Subscribes to the history backend once, after the first commit.
	fn setup_listeners(&self) {
		let mut listener = self.history_listener.lock();
		if listener.is_some() {
			return;
		}
		let weak = self.weak.clone();
		let id = self.history.listen(Arc::new(
			move |to: &str, _from: &str, info: NavigationInformation| {
				let Some(inner) = weak.upgrade() else {
					return;
				};
				if !inner.listening.load(Ordering::SeqCst) {
					tracing::debug!(to, "not listening, ignoring history change");
					return;
				}
				match tokio::runtime::Handle::try_current() {
					Ok(handle) => {
						let raw = RouteLocationRaw::url(to);
						handle.spawn(async move { inner.handle_pop(raw, info).await });
					}
					Err(_) => tracing::warn!(to, "history changed outside of a tokio runtime"),
				}
			},
		));
		*listener = Some(id);
	}

	/// Navigation triggered by the history backend. The backend already moved
	/// to `raw`, so nothing is written on commit and a navigation that does
	/// not commit moves the backend back.
	pub(crate) async fn handle_pop(&self, raw: RouteLocationRaw, info: NavigationInformation) {
		let from = self.current();
		let token = self.begin_attempt();

		let to = match self.resolve_location(&raw, &from) {
			Ok(to) => to,
			Err(error) => {
				tracing::warn!(error = %error, "cannot resolve the history location");
				return;
			}
		};
		match self.redirect_target(&to) {
			Ok(Some(target)) => {
				tracing::debug!(from = %to.full_path, "redirecting history navigation");
				let _ = self
					.push_with_redirect(target.replacing().forced(), Some(to))
					.await;
				return;
			}
			Ok(None) => {}
			Err(error) => {
				self.trigger_error(error.into(), &to, &from);
				return;
			}
		}

		let to = Arc::new(to);
		let outcome = match self.navigate(&to, &from, token).await {
			Ok(()) => self.commit(&to, &from, None, token).await,
			Err(interrupt) => Err(interrupt),
		};

		match outcome {
			Ok(()) => self.trigger_after_each(&to, &from, None),
			Err(Interrupt::Redirect(target)) => {
				let result = self
					.push_with_redirect(target.forced(), Some((*to).clone()))
					.await;
				if let Ok(Some(failure)) = result {
					let undone = failure.is(NavigationFailureKind::Aborted)
						|| failure.is(NavigationFailureKind::Duplicated);
					if undone && info.delta == 0 && info.kind == NavigationType::Pop {
						self.history.go(-1, false);
					}
				}
			}
			Err(Interrupt::Error(error)) => {
				if info.delta != 0 {
					self.history.go(-info.delta, false);
				}
				self.trigger_error(error, &to, &from);
			}
			Err(Interrupt::Failure(failure)) => {
				let undone = failure.is(NavigationFailureKind::Aborted)
					|| failure.is(NavigationFailureKind::Duplicated);
				if info.delta != 0 && !failure.is(NavigationFailureKind::Cancelled) {
					self.history.go(-info.delta, false);
				} else if undone && info.kind == NavigationType::Pop {
					self.history.go(-1, false);
				}
				self.conclude(failure);
			}
		}
	}
}
