use {
    crate::view::{Observer, View},
    async_std::stream::Stream,
    core::{
        pin::Pin,
        task::{Context, Poll, Waker},
    },
    std::sync::{Arc, Mutex},
};

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
               Queue Channel
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
struct ChannelState<T> {
    send_buf: Vec<T>,
    recv_iter: Option<std::vec::IntoIter<T>>,
    num_senders: usize,
    waker: Option<Waker>,
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub struct ChannelSender<T>(Arc<Mutex<ChannelState<T>>>);
pub struct ChannelReceiver<T>(Arc<Mutex<ChannelState<T>>>);

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<T> ChannelSender<T> {
    pub fn send(&self, msg: T) {
        let mut state = self.0.lock().unwrap();
        state.send_buf.push(msg);

        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

impl<V: View + ?Sized> Observer<V> for ChannelSender<V::Msg> {
    fn notify(&self, msg: &V::Msg) {
        self.send(msg.clone());
    }
}

impl<T> Clone for ChannelSender<T> {
    fn clone(&self) -> Self {
        self.0.lock().unwrap().num_senders += 1;
        ChannelSender(self.0.clone())
    }
}

impl<T> Drop for ChannelSender<T> {
    fn drop(&mut self) {
        let mut state = self.0.lock().unwrap();
        state.num_senders -= 1;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<T> ChannelReceiver<T> {
    /// Waits for the next batch, `None` once every sender is gone.
    pub async fn recv(&self) -> Option<Vec<T>> {
        ChannelRead(self.0.clone()).await
    }

    /// Everything sent since the last receive, `None` if nothing was sent.
    pub fn try_recv(&self) -> Option<Vec<T>> {
        let mut state = self.0.lock().unwrap();
        if state.send_buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut state.send_buf))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().send_buf.is_empty()
    }
}

struct ChannelRead<T>(Arc<Mutex<ChannelState<T>>>);

impl<T> std::future::Future for ChannelRead<T> {
    type Output = Option<Vec<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let mut state = self.0.lock().unwrap();
        if !state.send_buf.is_empty() {
            Poll::Ready(Some(std::mem::take(&mut state.send_buf)))
        } else if state.num_senders == 0 {
            Poll::Ready(None)
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<T> Stream for ChannelReceiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.0.lock().unwrap();

        if let Some(recv_iter) = state.recv_iter.as_mut() {
            if let Some(val) = recv_iter.next() {
                return Poll::Ready(Some(val));
            } else {
                state.recv_iter = None
            }
        }

        if !state.send_buf.is_empty() {
            let mut iter = std::mem::take(&mut state.send_buf).into_iter();
            let first = iter.next();
            state.recv_iter = Some(iter);
            Poll::Ready(first)
        } else if state.num_senders == 0 {
            Poll::Ready(None)
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

/*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
             Factory Functions
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
pub fn queue_channel<T>() -> (ChannelSender<T>, ChannelReceiver<T>) {
    let state = Arc::new(Mutex::new(ChannelState {
        send_buf: Vec::new(),
        recv_iter: None,
        num_senders: 1,
        waker: None,
    }));

    (ChannelSender(state.clone()), ChannelReceiver(state))
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
