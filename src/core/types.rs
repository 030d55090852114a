//! Built-in type tags
//!
//! Every collideable carries an integer type. Codes below [`RESERVED_2`] are
//! claimed by the framework; game-defined codes start there.

/// Integer tag attached to objects, sprites and tilemap areas.
pub type TypeCode = i32;

pub const NONE: TypeCode = 0;
pub const OBJECT: TypeCode = 1;
pub const SPRITE: TypeCode = 2;
pub const TILEMAP: TypeCode = 3;
pub const GROUP: TypeCode = 4;
/// First code available to games
pub const RESERVED_2: TypeCode = 5;
/// Size of the built-in debug color table
pub const TYPE_MAX: TypeCode = 20;

/// Check whether a code may be used by game code
#[must_use]
pub const fn is_user_type(code: TypeCode) -> bool {
    code >= RESERVED_2
}

/// Debug color (0xAARRGGBB) used when drawing a type's bounds.
///
/// Codes past the table wrap around it.
#[must_use]
pub fn debug_color(code: TypeCode) -> u32 {
    const TABLE: [u32; TYPE_MAX as usize] = [
        0xff_ff_ff_ff, // none
        0xff_d9_57_63, // object
        0xff_5b_6e_e1, // sprite
        0xff_6a_be_30, // tilemap
        0xff_fb_f2_36, // group
        0xff_df_71_26,
        0xff_99_e5_50,
        0xff_d7_7b_ba,
        0xff_8f_97_4a,
        0xff_63_9b_ff,
        0xff_ac_32_32,
        0xff_37_94_6e,
        0xff_76_42_8a,
        0xff_cb_db_fc,
        0xff_8a_6f_30,
        0xff_52_4b_24,
        0xff_32_3c_39,
        0xff_3f_3f_74,
        0xff_30_60_82,
        0xff_9b_ad_b7,
    ];
    TABLE[code.rem_euclid(TYPE_MAX) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_types_start_after_reserved() {
        assert!(!is_user_type(GROUP));
        assert!(is_user_type(RESERVED_2));
        assert!(is_user_type(RESERVED_2 + 10));
    }

    #[test]
    fn test_debug_color_wraps() {
        assert_eq!(debug_color(OBJECT), debug_color(OBJECT + TYPE_MAX));
        assert_eq!(debug_color(NONE), 0xffff_ffff);
    }
}
