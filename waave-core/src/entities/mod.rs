pub mod order;

pub use order::{
    CompleteOrderPayment, GetOrderByKey, Order, OrderNote, OrderStatus, TransitionOrderStatus,
};
