// Service module exports

pub mod countdown;
pub mod notification;
pub mod settings;
pub mod storage;
pub mod widget;
