//! Port of the CityHash64 variant ("b0rkhash") used by SCS# archives to
//! identify files by path.
//!
//! This is CityHash64 as it existed circa 2011, with the dialect quirks of
//! the archive format's own implementation kept intact: eight-byte inputs
//! take the 32-bit mixing path, and the long-input loop counter is
//! truncated to 32 bits before masking. Archives address their contents by
//! these exact bits, so "fixing" either behavior breaks every lookup.
//!
//! Not intended for cryptographic purposes.

/// Some primes between 2^63 and 2^64 for various uses.
const K0: u64 = 0xc3a5c85c97cb3127;
const K1: u64 = 0xb492b66fbe98f273;
const K2: u64 = 0x9ae16a3b2f90404f;
const K3: u64 = 0xc949d7c7509e6557;

/// Multiplier for the 128-to-64 bit mix.
const MUL: u64 = 0x9ddfea08eb382d69;

#[derive(Debug, Clone, Copy)]
struct Uint128 {
    lo: u64,
    hi: u64,
}

fn fetch32(s: &[u8]) -> u32 {
    // SAFETY: callers guarantee at least 4 bytes at the given position
    u32::from_le_bytes(s[..4].try_into().unwrap())
}

fn fetch64(s: &[u8]) -> u64 {
    // SAFETY: callers guarantee at least 8 bytes at the given position
    u64::from_le_bytes(s[..8].try_into().unwrap())
}

/// Bitwise right rotate.
fn rotate(val: u64, shift: u32) -> u64 {
    // Avoid shifting by 64: doing so yields an undefined result.
    if shift == 0 {
        return val;
    }
    (val >> shift) | (val << (64 - shift))
}

/// Bitwise right rotate; `shift` must be at least 1.
fn rotate_by_at_least_1(val: u64, shift: u32) -> u64 {
    (val >> shift) | (val << (64 - shift))
}

fn shift_mix(val: u64) -> u64 {
    val ^ (val >> 47)
}

fn hash_128_to_64(x: Uint128) -> u64 {
    let mut a = (x.lo ^ x.hi).wrapping_mul(MUL);
    a ^= a >> 47;
    let mut b = (x.hi ^ a).wrapping_mul(MUL);
    b ^= b >> 47;
    b.wrapping_mul(MUL)
}

fn hash_len_16(u: u64, v: u64) -> u64 {
    hash_128_to_64(Uint128 { lo: u, hi: v })
}

fn hash_len_0_to_16(s: &[u8]) -> u64 {
    let len = s.len();
    if len > 8 {
        let a = fetch64(s);
        let b = fetch64(&s[len - 8..]);
        return hash_len_16(a, rotate_by_at_least_1(b.wrapping_add(len as u64), len as u32)) ^ b;
    }

    if len >= 4 {
        let a = u64::from(fetch32(s));
        return hash_len_16((len as u64).wrapping_add(a << 3), u64::from(fetch32(&s[len - 4..])));
    }

    if len > 0 {
        let a = s[0];
        let b = s[len >> 1];
        let c = s[len - 1];
        let y = u32::from(a).wrapping_add(u32::from(b) << 8);
        let z = (len as u32).wrapping_add(u32::from(c) << 2);
        return shift_mix(u64::from(y).wrapping_mul(K2) ^ u64::from(z).wrapping_mul(K3))
            .wrapping_mul(K2);
    }

    K2
}

fn hash_len_17_to_32(s: &[u8]) -> u64 {
    let len = s.len();
    let a = fetch64(s).wrapping_mul(K1);
    let b = fetch64(&s[8..]);
    let c = fetch64(&s[len - 8..]).wrapping_mul(K2);
    let d = fetch64(&s[len - 16..]).wrapping_mul(K0);
    hash_len_16(
        rotate(a.wrapping_sub(b), 43)
            .wrapping_add(rotate(c, 30))
            .wrapping_add(d),
        a.wrapping_add(rotate(b ^ K3, 20))
            .wrapping_sub(c)
            .wrapping_add(len as u64),
    )
}

/// Return a 16-byte hash for 48 bytes. Quick and dirty.
/// Callers do best to use "random-looking" values for `a` and `b`.
fn weak_hash_len_32_with_seeds(w: u64, x: u64, y: u64, z: u64, a: u64, b: u64) -> Uint128 {
    let mut a = a.wrapping_add(w);
    let mut b = rotate(b.wrapping_add(a).wrapping_add(z), 21);
    let c = a;
    a = a.wrapping_add(x);
    a = a.wrapping_add(y);
    b = b.wrapping_add(rotate(a, 44));
    Uint128 {
        lo: a.wrapping_add(z),
        hi: b.wrapping_add(c),
    }
}

/// Return a 16-byte hash for `s[0..32]`, `a`, and `b`. Quick and dirty.
fn weak_hash_len_32_with_seeds_bytes(s: &[u8], a: u64, b: u64) -> Uint128 {
    weak_hash_len_32_with_seeds(
        fetch64(s),
        fetch64(&s[8..]),
        fetch64(&s[16..]),
        fetch64(&s[24..]),
        a,
        b,
    )
}

/// Return an 8-byte hash for 33 to 64 bytes.
fn hash_len_33_to_64(s: &[u8]) -> u64 {
    let len = s.len();
    let mut z = fetch64(&s[24..]);
    let mut a = fetch64(s)
        .wrapping_add((len as u64).wrapping_add(fetch64(&s[len - 16..])).wrapping_mul(K0));
    let mut b = rotate(a.wrapping_add(z), 52);
    let mut c = rotate(a, 37);
    a = a.wrapping_add(fetch64(&s[8..]));
    c = c.wrapping_add(rotate(a, 7));
    a = a.wrapping_add(fetch64(&s[16..]));
    let vf = a.wrapping_add(z);
    let vs = b.wrapping_add(rotate(a, 31)).wrapping_add(c);
    a = fetch64(&s[16..]).wrapping_add(fetch64(&s[len - 32..]));
    z = fetch64(&s[len - 8..]);
    b = rotate(a.wrapping_add(z), 52);
    c = rotate(a, 37);
    a = a.wrapping_add(fetch64(&s[len - 24..]));
    c = c.wrapping_add(rotate(a, 7));
    a = a.wrapping_add(fetch64(&s[len - 16..]));
    let wf = a.wrapping_add(z);
    let ws = b.wrapping_add(rotate(a, 31)).wrapping_add(c);
    let r = shift_mix(
        vf.wrapping_add(ws)
            .wrapping_mul(K2)
            .wrapping_add(wf.wrapping_add(vs).wrapping_mul(K0)),
    );
    shift_mix(r.wrapping_mul(K0).wrapping_add(vs)).wrapping_mul(K2)
}

/// Hash a byte string into a `u64`.
pub fn city_hash_64(s: &[u8]) -> u64 {
    let len = s.len();
    if len <= 32 {
        if len <= 16 {
            return hash_len_0_to_16(s);
        }
        return hash_len_17_to_32(s);
    } else if len <= 64 {
        return hash_len_33_to_64(s);
    }

    // For strings over 64 bytes we hash the end first, and then as we
    // loop we keep 56 bytes of state: v, w, x, y and z.
    let mut x = fetch64(&s[len - 40..]);
    let mut y = fetch64(&s[len - 16..]).wrapping_add(fetch64(&s[len - 56..]));
    let mut z = hash_len_16(
        fetch64(&s[len - 48..]).wrapping_add(len as u64),
        fetch64(&s[len - 24..]),
    );
    let mut v = weak_hash_len_32_with_seeds_bytes(&s[len - 64..], len as u64, z);
    let mut w = weak_hash_len_32_with_seeds_bytes(&s[len - 32..], y.wrapping_add(K1), x);
    x = x.wrapping_mul(K1).wrapping_add(fetch64(s));

    // Decrease len to the nearest multiple of 64, and operate on 64-byte
    // chunks. The counter is 32-bit and counts from one less than the
    // input length, exactly as the archive format's implementation does.
    let mut s = s;
    let mut remaining = (len as u32).wrapping_sub(1) & !63;
    loop {
        x = rotate(
            x.wrapping_add(y).wrapping_add(v.lo).wrapping_add(fetch64(&s[8..])),
            37,
        )
        .wrapping_mul(K1);
        y = rotate(y.wrapping_add(v.hi).wrapping_add(fetch64(&s[48..])), 42).wrapping_mul(K1);
        x ^= w.hi;
        y = y.wrapping_add(v.lo).wrapping_add(fetch64(&s[40..]));
        z = rotate(z.wrapping_add(w.lo), 33).wrapping_mul(K1);
        v = weak_hash_len_32_with_seeds_bytes(s, v.hi.wrapping_mul(K1), x.wrapping_add(w.lo));
        w = weak_hash_len_32_with_seeds_bytes(
            &s[32..],
            z.wrapping_add(w.hi),
            y.wrapping_add(fetch64(&s[16..])),
        );
        std::mem::swap(&mut z, &mut x);
        s = &s[64..];
        remaining = remaining.wrapping_sub(64);
        if remaining == 0 {
            break;
        }
    }

    hash_len_16(
        hash_len_16(v.lo, w.lo)
            .wrapping_add(shift_mix(y).wrapping_mul(K1))
            .wrapping_add(z),
        hash_len_16(v.hi, w.hi).wrapping_add(x),
    )
}

/// Hash a byte string into a `u64`, mixing in a seed.
pub fn city_hash_64_with_seed(s: &[u8], seed: u64) -> u64 {
    city_hash_64_with_seeds(s, K2, seed)
}

/// Hash a byte string into a `u64`, mixing in two seeds.
pub fn city_hash_64_with_seeds(s: &[u8], seed0: u64, seed1: u64) -> u64 {
    hash_len_16(city_hash_64(s).wrapping_sub(seed0), seed1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_vectors() {
        // Hashes as assigned by the archives themselves. The "def/city"
        // value diverges from upstream CityHash64 (eight-byte inputs take
        // the 32-bit path here) and must stay that way.
        for (input, expect) in [
            ("", 0x9AE16A3B2F90404F_u64),
            ("def", 0x2C6F469EFB31C45A),
            ("custom/city.sii", 0x1FFE051698FBA3E2),
            ("def/camera/city_start/actions.sii", 0xA74E0B70ADDB8E2D),
            ("def/city", 0x5E1B1D2C928270D1),
            ("def/economy_data.sii", 0xCE3123F8A189862E),
            ("def/map_data.sii", 0x73ADED9D5C6B4762),
            ("def/bank_data.sii", 0xDB6507B90C06F96A),
            ("locale", 0x8D9323EF8ACF7B46),
        ] {
            assert_eq!(
                city_hash_64(input.as_bytes()),
                expect,
                "wrong hash for {input:?}"
            );
        }
    }

    #[test]
    fn mid_length_vectors() {
        // 33..=64 byte inputs.
        for (input, expect) in [
            ("vehicle/truck/share/interior_cam.sii", 0x6A805DCC5E6D9843_u64),
            ("material/environment/vehicle_reflection.tobj", 0x9658B5FBB0090B41),
            (
                "def/vehicle/truck/man_tgx_euro6/sound/interior.sii",
                0x6AD3D982F69BE60C,
            ),
        ] {
            assert_eq!(
                city_hash_64(input.as_bytes()),
                expect,
                "wrong hash for {input:?}"
            );
        }
    }

    #[test]
    fn long_input_vectors() {
        let long_path = "def/world/prefab.def.sii/with/very/long/nested/path/to/make/it/longer.sii";
        assert_eq!(city_hash_64(long_path.as_bytes()), 0xC7F7A95482E44D40);

        // Lengths around the 64-byte block boundary, including exact
        // multiples of 64 where the truncated loop counter matters.
        for (len, expect) in [
            (64_usize, 0xAE3954C21BF053F4_u64),
            (65, 0xA93FDDD9EA728F69),
            (128, 0x8732752111926E2C),
            (129, 0x00CB604627FEE6EB),
        ] {
            let input = vec![b'a'; len];
            assert_eq!(city_hash_64(&input), expect, "wrong hash for len {len}");
        }
    }

    #[test]
    fn seeded_forms_mix_the_unseeded_hash() {
        let h = city_hash_64(b"def");
        assert_eq!(
            city_hash_64_with_seed(b"def", 17),
            hash_len_16(h.wrapping_sub(K2), 17)
        );
        assert_eq!(
            city_hash_64_with_seeds(b"def", 3, 7),
            hash_len_16(h.wrapping_sub(3), 7)
        );
    }
}
