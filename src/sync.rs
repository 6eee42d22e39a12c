//! Lock helpers shared by the frame, the progress monitors and the handlers.

use std::sync::{Mutex, MutexGuard};

/// Locks a mutex, recovering the value if a writer panicked.
///
/// Every critical section in this crate leaves its data consistent at each
/// statement, so a poisoned value is still safe to use.
pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn poisoned_mutex_is_recovered() {
        let m = Arc::new(Mutex::new(1));
        let m2 = Arc::clone(&m);
        let res = std::thread::spawn(move || {
            let mut g = m2.lock().unwrap();
            *g = 2;
            if true {
                panic!("writer died");
            }
        })
        .join();
        assert!(res.is_err());
        assert!(m.is_poisoned());
        assert_eq!(*lock(&m), 2);
    }
}
