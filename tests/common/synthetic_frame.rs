// 该文件是 Daolu （道路） 项目的一部分。
// tests/common/synthetic_frame.rs - 合成测试帧
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use daolu::lane::stroke::draw_thick_line_mut;
use image::{Rgb, RgbImage};

pub const WEDGE_WIDTH: u32 = 640;
pub const WEDGE_HEIGHT: u32 = 480;
pub const WEDGE_APEX: (i32, i32) = (320, 400);

/// Two bright lane markings converging from the top edge to an apex.
pub fn wedge_frame(thickness: u32) -> RgbImage {
  let mut frame = RgbImage::new(WEDGE_WIDTH, WEDGE_HEIGHT);
  let white = Rgb([255, 255, 255]);
  draw_thick_line_mut(&mut frame, (60, 0), WEDGE_APEX, thickness, white);
  draw_thick_line_mut(&mut frame, (580, 0), WEDGE_APEX, thickness, white);
  frame
}

pub fn black_frame(width: u32, height: u32) -> RgbImage {
  RgbImage::new(width, height)
}

/// Reproducible pseudo-random texture.
pub fn noise_frame(width: u32, height: u32, seed: u32) -> RgbImage {
  let mut state = seed.max(1);
  RgbImage::from_fn(width, height, |_, _| {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    let v = (state & 0xff) as u8;
    Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
  })
}
