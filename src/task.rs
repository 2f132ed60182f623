// 该文件是 Daolu （道路） 项目的一部分。
// src/task.rs - 任务循环
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

use std::{sync::mpsc, thread, time::Duration};
use tracing::{info, warn};

use crate::{Detector, frame::EndOfStream, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: M, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  F: EndOfStream,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Detector<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut detector: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input
      .next()
      .filter(|frame| !frame.is_end_of_stream())
      .ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始检测...");
    detector.prepare(&frame)?;
    let now = std::time::Instant::now();
    let result = detector.process(&frame)?;
    let elapsed = now.elapsed();
    info!("检测完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 安装 Ctrl-C 处理器，收到信号后在当前帧结束时退出
  pub fn interruptible(mut self) -> Self {
    self.interruptible = true;
    self
  }

  fn interrupt_channel(&self) -> anyhow::Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel();
    if self.interruptible {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      })?;
    }
    Ok(rx)
  }
}

impl<
  F: EndOfStream,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Detector<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, mut detector: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let rx = self.interrupt_channel()?;

    let mut frame_count = 0;
    let mut now = std::time::Instant::now();
    for frame in input {
      if frame.is_end_of_stream() {
        info!("读到空帧，输入结束");
        break;
      }
      frame_count += 1;
      info!("处理第 {} 帧图像", frame_count);

      detector.prepare(&frame)?;
      let result = detector.process(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      now = std::time::Instant::now();
      info!("检测完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

      if self.frame_number.map(|n| frame_count >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_count);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共处理 {} 帧", frame_count);
    Ok(())
  }
}
