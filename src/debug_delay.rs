use std::cell::Cell;
use std::num::Wrapping;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

/// This function is useful for inducing random jitter into our atomic
/// operations, shaking out more possible interleavings quickly. It gets
/// fully eliminated by the compiler in non-test code.
pub(crate) fn debug_delay() {
    static INTENSITY: LazyLock<u32> = LazyLock::new(|| {
        std::env::var("LAZYSET_DELAY_INTENSITY")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect(
                "LAZYSET_DELAY_INTENSITY must be set to a \
                 number of microseconds",
            )
    });

    if random(1000) == 1 {
        let duration = random(*INTENSITY);
        thread::sleep(Duration::from_micros(u64::from(duration)));
    }

    if random(2) == 0 {
        thread::yield_now();
    }
}

/// Generates a random number in `0..n`.
fn random(n: u32) -> u32 {
    thread_local! {
        static RNG: Cell<Wrapping<u32>> =
            const { Cell::new(Wrapping(1_406_868_647)) };
    }

    RNG.try_with(|rng| {
        // 32-bit Xorshift
        let mut x = rng.get();
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        rng.set(x);

        // Lemire's alternative to `x % n`
        ((u64::from(x.0)).wrapping_mul(u64::from(n)) >> 32) as u32
    })
    .unwrap_or(0)
}
